//! Version-folder resolution.
//!
//! A server root holds one subdirectory per version. The "latest" version is
//! the subdirectory with the greatest creation timestamp; on filesystems
//! that do not expose creation time the modification time is used instead.
//! Timestamp ties break to the lexicographically greatest directory name so
//! selection stays deterministic across platforms.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;

/// Errors raised while resolving the latest version folder.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The server root contains no subdirectories at all.
    #[error("no version folders found in {}", root.display())]
    NoVersions {
        /// The server root that was scanned.
        root: PathBuf,
    },

    /// I/O error while enumerating the server root.
    #[error("failed to scan server root: {0}")]
    Io(#[from] std::io::Error),
}

/// Find the most recently created version folder under `root`.
///
/// Only immediate children are considered, and only directories; plain
/// files are ignored. No side effects.
///
/// # Errors
///
/// Returns [`VersionError::NoVersions`] if `root` has no subdirectories,
/// or [`VersionError::Io`] if the directory cannot be read.
pub fn latest_version(root: &Path) -> Result<PathBuf, VersionError> {
    let mut latest: Option<(SystemTime, OsString, PathBuf)> = None;

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let metadata = entry.metadata()?;
        // Creation time where the platform has it, modification time where
        // it does not.
        let stamp = metadata.created().or_else(|_| metadata.modified())?;
        let name = entry.file_name();

        if latest
            .as_ref()
            .is_none_or(|(best_stamp, best_name, _)| newer(stamp, &name, *best_stamp, best_name))
        {
            latest = Some((stamp, name, path));
        }
    }

    latest
        .map(|(_, _, path)| path)
        .ok_or_else(|| VersionError::NoVersions {
            root: root.to_path_buf(),
        })
}

/// Whether `(stamp, name)` beats the current best candidate.
fn newer(stamp: SystemTime, name: &OsStr, best_stamp: SystemTime, best_name: &OsStr) -> bool {
    stamp > best_stamp || (stamp == best_stamp && name > best_name)
}

/// Check whether `root/version` already exists. Pure existence test, no
/// side effects; the caller treats a hit as "skip", not as an error.
#[must_use]
pub fn version_exists(root: &Path, version: &str) -> bool {
    root.join(version).exists()
}
