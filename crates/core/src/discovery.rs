//! Recursive discovery of files under a directory.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::engine::ConversionTask;

/// Errors that abort a discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The root is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A directory could not be listed.
    #[error("Failed to read directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lists every regular file reachable from `root` as a task.
///
/// Relative paths are the file's ancestry below `root` joined with `/`,
/// preceded by `prefix` when given. Entries are visited depth-first in
/// name order. Symbolic links are not followed.
pub async fn discover(
    root: &Path,
    prefix: Option<&str>,
) -> Result<Vec<ConversionTask>, DiscoveryError> {
    let meta = tokio::fs::metadata(root)
        .await
        .map_err(|e| DiscoveryError::ReadDir {
            path: root.to_path_buf(),
            source: e,
        })?;
    if !meta.is_dir() {
        return Err(DiscoveryError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut tasks = Vec::new();
    walk(root.to_path_buf(), prefix.map(str::to_string), &mut tasks).await?;
    debug!("Discovered {} files under {}", tasks.len(), root.display());
    Ok(tasks)
}

fn walk(
    dir: PathBuf,
    prefix: Option<String>,
    tasks: &mut Vec<ConversionTask>,
) -> BoxFuture<'_, Result<(), DiscoveryError>> {
    async move {
        let read_err = |e| DiscoveryError::ReadDir {
            path: dir.clone(),
            source: e,
        };

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir).await.map_err(read_err)?;
        while let Some(entry) = reader.next_entry().await.map_err(read_err)? {
            let file_type = entry.file_type().await.map_err(read_err)?;
            entries.push((entry.file_name(), entry.path(), file_type));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, path, file_type) in entries {
            let name = name.to_string_lossy().into_owned();
            let relative = match &prefix {
                Some(p) => format!("{}/{}", p, name),
                None => name,
            };

            if file_type.is_dir() {
                walk(path, Some(relative), tasks).await?;
            } else if file_type.is_file() {
                tasks.push(ConversionTask::from_discovery(path, dir.clone(), relative));
            } else {
                debug!("Skipping non-regular entry {}", path.display());
            }
        }

        Ok(())
    }
    .boxed()
}
