//! File system storage implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::StorageError;
use super::traits::{PermissionState, Storage};
use crate::config::StorageConfig;
use crate::paths::file_name_of;

/// Storage backed by the local file system.
pub struct FsStorage {
    config: StorageConfig,
}

impl FsStorage {
    /// Creates a new file system storage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Creates a storage with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(StorageConfig::default())
    }

    /// Hidden sibling used to stage a write before it replaces `name`.
    fn staging_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!(".{}.{}.part", name, Uuid::new_v4().simple()))
    }

    /// Removes a staging file left by a failed write.
    async fn discard_staging(staging: &Path) {
        match fs::remove_file(staging).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove staging file {}: {}",
                staging.display(),
                e
            ),
        }
    }

    /// Writes `data` to `staging` and renames it over `destination`.
    ///
    /// `destination` is untouched unless every byte reached `staging`.
    /// `permissions`, when given, are applied to the staged file first.
    async fn commit_staged(
        staging: &Path,
        destination: &Path,
        data: &[u8],
        permissions: Option<std::fs::Permissions>,
    ) -> Result<(), StorageError> {
        let staged = async {
            let mut handle = fs::File::create(staging).await?;
            handle.write_all(data).await?;
            handle.sync_all().await?;
            if let Some(perms) = permissions {
                fs::set_permissions(staging, perms).await?;
            }
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = staged {
            Self::discard_staging(staging).await;
            return Err(StorageError::from_io(staging, e));
        }

        if let Err(e) = fs::rename(staging, destination).await {
            Self::discard_staging(staging).await;
            return Err(StorageError::from_io(destination, e));
        }

        Ok(())
    }

    /// Whether the owner write bit is set.
    fn owner_writable(meta: &std::fs::Metadata) -> bool {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode() & 0o200 != 0
        }
        #[cfg(not(unix))]
        {
            !meta.permissions().readonly()
        }
    }

    /// Adds the owner write bit to `target`.
    async fn make_writable(target: &Path) -> Result<(), StorageError> {
        let meta = fs::metadata(target)
            .await
            .map_err(|e| StorageError::from_io(target, e))?;
        let mut perms = meta.permissions();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            perms.set_mode(perms.mode() | 0o200);
        }
        #[cfg(not(unix))]
        {
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
        }

        fs::set_permissions(target, perms)
            .await
            .map_err(|e| StorageError::from_io(target, e))
    }
}

#[async_trait]
impl Storage for FsStorage {
    fn name(&self) -> &str {
        "fs"
    }

    async fn query_permission(&self, target: &Path) -> Result<PermissionState, StorageError> {
        let meta = fs::metadata(target)
            .await
            .map_err(|e| StorageError::from_io(target, e))?;

        if Self::owner_writable(&meta) {
            Ok(PermissionState::Granted)
        } else if self.config.grant_write_access {
            Ok(PermissionState::Prompt)
        } else {
            Ok(PermissionState::Denied)
        }
    }

    async fn request_permission(&self, target: &Path) -> Result<PermissionState, StorageError> {
        match self.query_permission(target).await? {
            PermissionState::Prompt => {
                debug!("Granting write access to {}", target.display());
                Self::make_writable(target).await?;
                self.query_permission(target).await
            }
            state => Ok(state),
        }
    }

    async fn read(&self, file: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(file).await.map_err(|e| StorageError::from_io(file, e))
    }

    async fn write_entry(
        &self,
        dir: &Path,
        name: &str,
        data: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let destination = dir.join(name);
        let staging = Self::staging_path(dir, name);

        Self::commit_staged(&staging, &destination, data, None).await?;
        Ok(destination)
    }

    async fn remove_entry(&self, dir: &Path, name: &str) -> Result<(), StorageError> {
        let path = dir.join(name);
        fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::from_io(&path, e))
    }

    async fn overwrite(&self, file: &Path, data: &[u8]) -> Result<(), StorageError> {
        let meta = fs::metadata(file)
            .await
            .map_err(|e| StorageError::from_io(file, e))?;
        if !meta.is_file() {
            return Err(StorageError::from_io(
                file,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let (Some(dir), Some(name)) = (file.parent(), file_name_of(file)) else {
            return Err(StorageError::NotFound {
                path: file.to_path_buf(),
            });
        };

        // Same name, new content: the original survives any failed write
        let staging = Self::staging_path(dir, &name);
        Self::commit_staged(&staging, file, data, Some(meta.permissions())).await?;
        debug!("Replaced content of {}", file.display());
        Ok(())
    }
}
