//! Sequential, fault-isolated per-server pipeline.
//!
//! Servers are processed one at a time in manifest order. Per server the
//! steps are: root path check, target-version existence check, latest
//! version resolution, clone, rewrite. A missing root or an already
//! existing target is a skip, not an error. Anything that fails after that
//! point aborts that server only; the run always continues to the next
//! server. No retries, no rollback.

use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::clone::{self, CloneError};
use crate::config::{EnvironmentRuleset, ServerEntry};
use crate::rewrite::{self, RewriteError};
use crate::version::{self, VersionError};

/// Run-wide options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Walk the per-server decision sequence without cloning or rewriting.
    pub dry_run: bool,
}

/// Terminal state of one server's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerOutcome {
    /// A new version folder was cloned and rewritten.
    Updated {
        /// Source version name.
        from: String,
        /// New version name.
        to: String,
    },

    /// Dry run: the server would have been updated.
    WouldUpdate {
        /// Source version name.
        from: String,
        /// New version name.
        to: String,
    },

    /// The configured root path does not exist.
    SkippedMissingPath,

    /// The target version folder is already present.
    SkippedExistingVersion,
}

impl ServerOutcome {
    /// Whether this outcome is a skip rather than an update.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::SkippedMissingPath | Self::SkippedExistingVersion)
    }
}

impl fmt::Display for ServerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated { from, to } => write!(f, "updated {from} -> {to}"),
            Self::WouldUpdate { from, to } => write!(f, "would update {from} -> {to} (dry run)"),
            Self::SkippedMissingPath => write!(f, "skipped: path not found"),
            Self::SkippedExistingVersion => write!(f, "skipped: version already exists"),
        }
    }
}

/// Failure isolated to one server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Latest-version resolution failed (no versions, or I/O).
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Cloning the version folder failed.
    #[error(transparent)]
    Clone(#[from] CloneError),

    /// Rewriting the cloned files failed.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Outcome of a whole run, one entry per configured server.
#[derive(Debug)]
pub struct RunReport {
    /// `(server name, terminal state)` in processing order.
    pub entries: Vec<(String, Result<ServerOutcome, ServerError>)>,
}

impl RunReport {
    /// Number of servers updated (or, dry run, that would be updated).
    #[must_use]
    pub fn updated(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, r)| {
                matches!(
                    r,
                    Ok(ServerOutcome::Updated { .. } | ServerOutcome::WouldUpdate { .. })
                )
            })
            .count()
    }

    /// Number of servers skipped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, r)| matches!(r, Ok(outcome) if outcome.is_skip()))
            .count()
    }

    /// Number of servers that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|(_, r)| r.is_err()).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, result) in &self.entries {
            match result {
                Ok(outcome) => writeln!(f, "{name}: {outcome}")?,
                Err(err) => writeln!(f, "{name}: failed: {err}")?,
            }
        }
        write!(
            f,
            "{} updated, {} skipped, {} failed",
            self.updated(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Run the pipeline for a single server.
///
/// # Errors
///
/// Returns a [`ServerError`] when version resolution, cloning, or
/// rewriting fails. Skips are not errors; they come back as outcomes.
pub fn process_server(
    server: &ServerEntry,
    new_version: &str,
    ruleset: &EnvironmentRuleset,
    options: RunOptions,
) -> Result<ServerOutcome, ServerError> {
    if !server.path.exists() {
        warn!("path not found: {}", server.path.display());
        return Ok(ServerOutcome::SkippedMissingPath);
    }

    if version::version_exists(&server.path, new_version) {
        info!(
            "version {new_version} already exists in {}, skipping",
            server.path.display()
        );
        return Ok(ServerOutcome::SkippedExistingVersion);
    }

    let latest = version::latest_version(&server.path)?;
    let from = folder_name(&latest);
    let to = new_version.to_string();

    if options.dry_run {
        return Ok(ServerOutcome::WouldUpdate { from, to });
    }

    let cloned = clone::clone_version(&latest, new_version)?;
    let files = rewrite::rewrite_tree(&cloned, ruleset)?;

    info!(
        "server {} updated to version {new_version} ({files} file(s) rewritten)",
        server.name
    );
    Ok(ServerOutcome::Updated { from, to })
}

/// Run the pipeline for every server, in manifest order.
///
/// Per-server failures are recorded in the report and the loop continues;
/// nothing here aborts the run as a whole.
#[must_use]
pub fn run(
    servers: &[ServerEntry],
    new_version: &str,
    ruleset: &EnvironmentRuleset,
    options: RunOptions,
) -> RunReport {
    let mut entries = Vec::with_capacity(servers.len());

    for server in servers {
        info!("processing {}", server.name);
        let result = process_server(server, new_version, ruleset, options);
        if let Err(err) = &result {
            error!("server {} failed: {err}", server.name);
        }
        entries.push((server.name.clone(), result));
    }

    RunReport { entries }
}

/// Last path component as a display string.
fn folder_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
