//! Recursive version-folder duplication.
//!
//! Clones an existing version folder to a sibling path named after the
//! target version. Contents and directory structure are preserved exactly;
//! file metadata is preserved to the extent `fs::copy` preserves it
//! (permissions on Unix). There is no rollback: a failure mid-copy leaves
//! whatever was written and aborts processing of that server.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Errors raised while cloning a version folder.
#[derive(Debug, Error)]
pub enum CloneError {
    /// The destination path already exists.
    ///
    /// The pipeline checks for this before cloning, so hitting it here
    /// means the tree changed under us.
    #[error("destination already exists: {}", path.display())]
    DestinationExists {
        /// The conflicting destination.
        path: PathBuf,
    },

    /// I/O failure during the copy (permissions, disk space, ...).
    #[error("failed to copy version folder: {0}")]
    Io(#[from] std::io::Error),
}

/// Clone the version folder at `source` to `source`'s parent under
/// `new_version`, returning the path of the new folder.
///
/// # Errors
///
/// Returns [`CloneError::DestinationExists`] if the target path is already
/// present, or [`CloneError::Io`] on any copy failure.
pub fn clone_version(source: &Path, new_version: &str) -> Result<PathBuf, CloneError> {
    let parent = source.parent().unwrap_or(Path::new(""));
    let destination = parent.join(new_version);

    copy_tree(source, &destination)?;

    info!(
        "copied version {} -> {}",
        source.file_name().unwrap_or_default().to_string_lossy(),
        new_version
    );

    Ok(destination)
}

/// Recursively copy the directory tree at `src` to `dst`.
fn copy_tree(src: &Path, dst: &Path) -> Result<(), CloneError> {
    if dst.exists() {
        return Err(CloneError::DestinationExists {
            path: dst.to_path_buf(),
        });
    }
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if from.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }

    Ok(())
}
