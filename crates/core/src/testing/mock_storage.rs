//! Mock storage for testing.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{PermissionState, Storage, StorageError};

/// A recorded storage operation, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    QueryPermission(PathBuf),
    RequestPermission(PathBuf),
    Read(PathBuf),
    WriteEntry(PathBuf),
    RemoveEntry(PathBuf),
    Overwrite(PathBuf),
}

/// In-memory implementation of the Storage trait.
///
/// Every target is granted unless configured otherwise. A target set to
/// `Prompt` is granted on request when `grant_on_request` is on (the
/// default) and denied otherwise.
#[derive(Debug, Clone)]
pub struct MockStorage {
    files: Arc<RwLock<BTreeMap<PathBuf, Vec<u8>>>>,
    permissions: Arc<RwLock<HashMap<PathBuf, PermissionState>>>,
    grant_on_request: Arc<RwLock<bool>>,
    failing_writes: Arc<RwLock<HashSet<PathBuf>>>,
    operations: Arc<RwLock<Vec<StorageOp>>>,
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorage {
    /// Create an empty mock storage.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
            permissions: Arc::new(RwLock::new(HashMap::new())),
            grant_on_request: Arc::new(RwLock::new(true)),
            failing_writes: Arc::new(RwLock::new(HashSet::new())),
            operations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add or replace a file.
    pub async fn add_file(&self, path: impl AsRef<Path>, data: &[u8]) {
        self.files
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), data.to_vec());
    }

    /// Content of a file, if present.
    pub async fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.read().await.get(path.as_ref()).cloned()
    }

    /// All file paths, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.files.read().await.keys().cloned().collect()
    }

    /// Set the permission state of a target.
    pub async fn set_permission(&self, target: impl AsRef<Path>, state: PermissionState) {
        self.permissions
            .write()
            .await
            .insert(target.as_ref().to_path_buf(), state);
    }

    /// Whether requests for `Prompt` targets are granted.
    pub async fn set_grant_on_request(&self, grant: bool) {
        *self.grant_on_request.write().await = grant;
    }

    /// Make writes to `path` fail.
    pub async fn fail_writes_to(&self, path: impl AsRef<Path>) {
        self.failing_writes
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Get all recorded operations.
    pub async fn operations(&self) -> Vec<StorageOp> {
        self.operations.read().await.clone()
    }

    /// Targets of recorded permission requests.
    pub async fn permission_requests(&self) -> Vec<PathBuf> {
        self.operations
            .read()
            .await
            .iter()
            .filter_map(|op| match op {
                StorageOp::RequestPermission(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, op: StorageOp) {
        self.operations.write().await.push(op);
    }

    async fn permission_of(&self, target: &Path) -> PermissionState {
        self.permissions
            .read()
            .await
            .get(target)
            .copied()
            .unwrap_or(PermissionState::Granted)
    }

    async fn check_write(&self, path: &Path) -> Result<(), StorageError> {
        if self.failing_writes.read().await.contains(path) {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("simulated write failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MockStorage {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query_permission(&self, target: &Path) -> Result<PermissionState, StorageError> {
        self.record(StorageOp::QueryPermission(target.to_path_buf()))
            .await;
        Ok(self.permission_of(target).await)
    }

    async fn request_permission(&self, target: &Path) -> Result<PermissionState, StorageError> {
        self.record(StorageOp::RequestPermission(target.to_path_buf()))
            .await;

        match self.permission_of(target).await {
            PermissionState::Prompt => {
                let state = if *self.grant_on_request.read().await {
                    PermissionState::Granted
                } else {
                    PermissionState::Denied
                };
                self.set_permission(target, state).await;
                Ok(state)
            }
            state => Ok(state),
        }
    }

    async fn read(&self, file: &Path) -> Result<Vec<u8>, StorageError> {
        self.record(StorageOp::Read(file.to_path_buf())).await;
        self.file(file).await.ok_or_else(|| StorageError::NotFound {
            path: file.to_path_buf(),
        })
    }

    async fn write_entry(
        &self,
        dir: &Path,
        name: &str,
        data: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = dir.join(name);
        self.record(StorageOp::WriteEntry(path.clone())).await;
        self.check_write(&path).await?;
        self.add_file(&path, data).await;
        Ok(path)
    }

    async fn remove_entry(&self, dir: &Path, name: &str) -> Result<(), StorageError> {
        let path = dir.join(name);
        self.record(StorageOp::RemoveEntry(path.clone())).await;
        match self.files.write().await.remove(&path) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound { path }),
        }
    }

    async fn overwrite(&self, file: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.record(StorageOp::Overwrite(file.to_path_buf())).await;
        self.check_write(file).await?;
        match self.files.write().await.get_mut(file) {
            Some(content) => {
                *content = data.to_vec();
                Ok(())
            }
            None => Err(StorageError::NotFound {
                path: file.to_path_buf(),
            }),
        }
    }
}
