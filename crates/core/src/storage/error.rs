//! Error types for the storage module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while accessing files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File or directory not found.
    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    /// The platform refused the operation.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// I/O error while accessing a path.
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Maps an I/O error on `path` to the matching variant.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }
}
