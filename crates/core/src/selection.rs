//! Turning picked or dropped paths into conversion tasks.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::discovery::{discover, DiscoveryError};
use crate::engine::ConversionTask;
use crate::paths::file_name_of;
use crate::storage::{PermissionState, Storage};

/// Errors that stop a selection before any batch starts.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// A selected entry cannot be handled as a file or directory.
    #[error("Unsupported entry: {reason}")]
    CapabilityUnsupported { reason: String },

    /// A folder selection did not point at a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A file selection did not point at a regular file.
    #[error("Not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Traversal failed.
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
}

/// Kind of a selected path.
enum EntryKind {
    File,
    Directory,
    Other,
}

async fn entry_kind(path: &Path) -> EntryKind {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => EntryKind::Directory,
        Ok(meta) if meta.is_file() => EntryKind::File,
        _ => EntryKind::Other,
    }
}

/// Loads every file under a picked folder.
///
/// Write permission on the folder is requested up front. A refusal does not
/// stop the selection; the affected tasks fail individually later.
pub async fn select_folder<S: Storage>(
    storage: &S,
    dir: &Path,
) -> Result<Vec<ConversionTask>, SelectionError> {
    if !matches!(entry_kind(dir).await, EntryKind::Directory) {
        return Err(SelectionError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    match storage.request_permission(dir).await {
        Ok(PermissionState::Granted) => {}
        Ok(state) => warn!("Write access to {} not granted ({:?})", dir.display(), state),
        Err(e) => warn!("Could not request write access to {}: {}", dir.display(), e),
    }

    let tasks = discover(dir, None).await?;
    info!("Loaded {} files from {}", tasks.len(), dir.display());
    Ok(tasks)
}

/// Loads individually picked files. They have no known container.
pub async fn select_files(paths: &[PathBuf]) -> Result<Vec<ConversionTask>, SelectionError> {
    let mut tasks = Vec::with_capacity(paths.len());
    for path in paths {
        if !matches!(entry_kind(path).await, EntryKind::File) {
            return Err(SelectionError::NotAFile { path: path.clone() });
        }
        tasks.push(ConversionTask::from_selection(path.clone()));
    }
    Ok(tasks)
}

/// Loads dropped entries.
///
/// Directories are discovered with their own name as the root of the
/// relative paths; files become tasks without a container. Any entry that
/// is neither rejects the whole drop.
pub async fn drop_entries(paths: &[PathBuf]) -> Result<Vec<ConversionTask>, SelectionError> {
    let mut kinds = Vec::with_capacity(paths.len());
    for path in paths {
        match entry_kind(path).await {
            EntryKind::Other => {
                return Err(SelectionError::CapabilityUnsupported {
                    reason: format!(
                        "{} is not a file or directory that can be opened for writing",
                        path.display()
                    ),
                })
            }
            kind => kinds.push(kind),
        }
    }

    let mut tasks = Vec::new();
    for (path, kind) in paths.iter().zip(kinds) {
        match kind {
            EntryKind::Directory => {
                let name = file_name_of(path).unwrap_or_else(|| path.display().to_string());
                tasks.extend(discover(path, Some(&name)).await?);
            }
            _ => tasks.push(ConversionTask::from_selection(path.clone())),
        }
    }
    Ok(tasks)
}
