//! A selection plus the engine that converts it.

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::codec::{ImageCodec, VideoCodec};
use crate::selection::{drop_entries, select_files, select_folder, SelectionError};
use crate::storage::Storage;

use super::runner::ConversionEngine;
use super::status::BatchStatus;
use super::types::{BatchReport, ConversionTask};

/// Holds the currently loaded tasks and the user-facing status.
///
/// Every new selection replaces the previous tasks.
pub struct Session<I, V, S>
where
    I: ImageCodec,
    V: VideoCodec,
    S: Storage,
{
    engine: ConversionEngine<I, V, S>,
    tasks: Vec<ConversionTask>,
    status: BatchStatus,
}

impl<I, V, S> Session<I, V, S>
where
    I: ImageCodec,
    V: VideoCodec,
    S: Storage,
{
    pub fn new(engine: ConversionEngine<I, V, S>) -> Self {
        Self {
            engine,
            tasks: Vec::new(),
            status: BatchStatus::Idle,
        }
    }

    pub fn engine(&self) -> &ConversionEngine<I, V, S> {
        &self.engine
    }

    pub fn tasks(&self) -> &[ConversionTask] {
        &self.tasks
    }

    pub fn status(&self) -> &BatchStatus {
        &self.status
    }

    /// Loads every file under a folder.
    pub async fn load_folder(&mut self, dir: &Path) -> Result<usize, SelectionError> {
        self.status = BatchStatus::Scanning;
        let result = select_folder(self.engine.storage(), dir).await;
        self.finish_loading(result)
    }

    /// Loads individually picked files.
    pub async fn load_files(&mut self, paths: &[PathBuf]) -> Result<usize, SelectionError> {
        self.status = BatchStatus::Scanning;
        let result = select_files(paths).await;
        self.finish_loading(result)
    }

    /// Loads dropped files and folders.
    pub async fn load_dropped(&mut self, paths: &[PathBuf]) -> Result<usize, SelectionError> {
        self.status = BatchStatus::Scanning;
        let result = drop_entries(paths).await;
        self.finish_loading(result)
    }

    fn finish_loading(
        &mut self,
        result: Result<Vec<ConversionTask>, SelectionError>,
    ) -> Result<usize, SelectionError> {
        match result {
            Ok(tasks) => {
                let classifier = self.engine.classifier();
                let convertible = tasks
                    .iter()
                    .filter(|t| classifier.classify(&t.file_name()).is_convertible())
                    .count();
                self.status = BatchStatus::Loaded {
                    files: tasks.len(),
                    convertible,
                };
                self.tasks = tasks;
                Ok(self.tasks.len())
            }
            Err(e) => {
                warn!("Selection failed: {}", e);
                self.tasks.clear();
                self.status = match &e {
                    SelectionError::CapabilityUnsupported { reason } => {
                        BatchStatus::Unsupported {
                            message: reason.clone(),
                        }
                    }
                    _ => BatchStatus::Idle,
                };
                Err(e)
            }
        }
    }

    /// Converts the loaded tasks.
    ///
    /// Returns `None` when nothing is loaded or the engine is busy.
    pub async fn convert(&mut self) -> Option<BatchReport> {
        if self.tasks.is_empty() || self.engine.is_running() {
            return None;
        }

        self.status = BatchStatus::Converting {
            done: 0,
            total: self.tasks.len(),
        };
        let report = self.engine.process_items(&self.tasks).await?;
        self.status = BatchStatus::Done {
            converted: report.converted,
            skipped: report.skipped,
            failed: report.failed,
        };
        Some(report)
    }
}
