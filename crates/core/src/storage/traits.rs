//! Trait definitions for the storage module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::StorageError;

/// Read-write permission on a file or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Read-write access is available.
    Granted,
    /// Not yet granted; a request may grant it.
    Prompt,
    /// Refused.
    Denied,
}

/// Access to the files being converted.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the name of this storage implementation.
    fn name(&self) -> &str;

    /// Reports the current read-write permission without changing it.
    async fn query_permission(&self, target: &Path) -> Result<PermissionState, StorageError>;

    /// Asks for read-write permission.
    ///
    /// Idempotent: a target that is already granted stays granted and no
    /// grant is attempted.
    async fn request_permission(&self, target: &Path) -> Result<PermissionState, StorageError>;

    /// Reads the full content of a file.
    async fn read(&self, file: &Path) -> Result<Vec<u8>, StorageError>;

    /// Creates or overwrites the entry `name` inside `dir` with `data`.
    ///
    /// Returns the path of the written entry. The entry only becomes
    /// visible under `name` once all bytes are written.
    async fn write_entry(&self, dir: &Path, name: &str, data: &[u8])
        -> Result<PathBuf, StorageError>;

    /// Removes the entry `name` from `dir`.
    async fn remove_entry(&self, dir: &Path, name: &str) -> Result<(), StorageError>;

    /// Replaces the content of an existing file, keeping its name.
    async fn overwrite(&self, file: &Path, data: &[u8]) -> Result<(), StorageError>;
}
