//! In-place rewriting of `.ini` files in a cloned version folder.
//!
//! Two passes run over every line of every `.ini` file (extension matched
//! case-insensitively):
//!
//! 1. ordered literal substitutions from the environment ruleset, applied
//!    sequentially with `str::replace`;
//! 2. port renumbering: every 4-5 digit numeral whose value lies in the
//!    [4000, 6000] window is shifted by the ruleset's `port_offset`.
//!
//! Renumbering collects the numerals first and then replaces each one as a
//! literal substring across the whole line, not position-aware. If a
//! shifted value's decimal text coincides with another numeral still
//! pending on the same line, that numeral gets shifted again. This mirrors
//! the tool's long-standing behavior and is pinned by tests; see
//! `test_colliding_numerals_chain_shifts`.
//!
//! Rewriting is not idempotent: running it twice shifts any rewritten port
//! that still lands inside the window a second time.

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::config::EnvironmentRuleset;

/// Numeric window treated as a port number when renumbering.
pub const PORT_WINDOW: RangeInclusive<i64> = 4000..=6000;

/// Matches maximal-first runs of 4-5 digits, greedy, non-overlapping.
static PORT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4,5}").expect("port pattern is valid"));

/// Errors raised while rewriting cloned files.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// I/O failure reading, walking, or writing back a file.
    #[error("failed to rewrite {}: {source}", path.display())]
    Io {
        /// The file or directory being processed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Apply the ruleset to a single line and return the rewritten text.
///
/// Substitutions run first, in ruleset order; the port scan then runs over
/// the already-substituted line.
#[must_use]
pub fn rewrite_line(line: &str, ruleset: &EnvironmentRuleset) -> String {
    let mut line = line.to_string();

    for rule in &ruleset.replace {
        line = line.replace(&rule.from, &rule.to);
    }

    // Numerals are collected from the substituted line up front; each
    // replacement below then rewrites the line as it currently stands.
    let scanned = line.clone();
    for numeral in PORT_PATTERN.find_iter(&scanned) {
        let digits = numeral.as_str();
        let Ok(value) = digits.parse::<i64>() else {
            continue;
        };
        if PORT_WINDOW.contains(&value) {
            line = line.replace(digits, &(value + ruleset.port_offset).to_string());
        }
    }

    line
}

/// Rewrite one file in place.
///
/// Line terminators are preserved as-is (the rewrite loop works on
/// terminator-inclusive slices). No backup of the original content is kept.
///
/// # Errors
///
/// Returns [`RewriteError::Io`] if the file cannot be read or written;
/// this includes files that are not valid UTF-8.
pub fn rewrite_file(path: &Path, ruleset: &EnvironmentRuleset) -> Result<(), RewriteError> {
    let content = fs::read_to_string(path).map_err(|source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rewritten = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        rewritten.push_str(&rewrite_line(line, ruleset));
    }

    fs::write(path, rewritten).map_err(|source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Walk `root` recursively and rewrite every `.ini` file in place.
///
/// Returns the number of files rewritten.
///
/// # Errors
///
/// Returns [`RewriteError::Io`] on any walk or rewrite failure; the walk
/// stops at the first error (no rollback of files already rewritten).
pub fn rewrite_tree(root: &Path, ruleset: &EnvironmentRuleset) -> Result<usize, RewriteError> {
    let mut rewritten = 0;

    let entries = fs::read_dir(root).map_err(|source| RewriteError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| RewriteError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            rewritten += rewrite_tree(&path, ruleset)?;
        } else if is_ini_file(&path) {
            debug!("rewriting {}", path.display());
            rewrite_file(&path, ruleset)?;
            rewritten += 1;
        }
    }

    Ok(rewritten)
}

/// Case-insensitive `.ini` filename test.
fn is_ini_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().to_lowercase().ends_with(".ini"))
}
