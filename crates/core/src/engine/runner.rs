//! Conversion engine implementation.
//!
//! Visits tasks strictly one after another. The video codec is a single
//! shared instance with one scratch area, and only one decoded item is held
//! in memory at a time.

use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::classify::{Classifier, MediaClass};
use crate::codec::{ImageCodec, VideoCodec};
use crate::paths::{extension_of, replace_extension};
use crate::storage::{PermissionState, Storage};

use super::types::{
    BatchPhase, BatchReport, BatchState, ConversionTask, TaskError, TaskOutcome, TaskRecord,
};

/// Clears the running flag when a batch ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives a batch of tasks through classification, conversion and
/// in-place write-back.
pub struct ConversionEngine<I, V, S>
where
    I: ImageCodec,
    V: VideoCodec,
    S: Storage,
{
    classifier: Classifier,
    image: I,
    video: V,
    storage: S,
    running: AtomicBool,
    state_tx: watch::Sender<BatchState>,
}

impl<I, V, S> ConversionEngine<I, V, S>
where
    I: ImageCodec,
    V: VideoCodec,
    S: Storage,
{
    /// Create a new engine. Codecs are not initialized until first use.
    pub fn new(classifier: Classifier, image: I, video: V, storage: S) -> Self {
        let (state_tx, _) = watch::channel(BatchState::default());

        Self {
            classifier,
            image,
            video,
            storage,
            running: AtomicBool::new(false),
            state_tx,
        }
    }

    /// Receives a snapshot after every task of every batch.
    pub fn subscribe(&self) -> watch::Receiver<BatchState> {
        self.state_tx.subscribe()
    }

    /// Current batch state.
    pub fn state(&self) -> BatchState {
        self.state_tx.borrow().clone()
    }

    /// Whether a batch is converting right now.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn image_codec(&self) -> &I {
        &self.image
    }

    pub fn video_codec(&self) -> &V {
        &self.video
    }

    /// Converts every task in order and returns the final tally.
    ///
    /// Returns `None` without touching any state when `tasks` is empty or
    /// another batch is already converting. A failing task is counted and
    /// the batch moves on.
    pub async fn process_items(&self, tasks: &[ConversionTask]) -> Option<BatchReport> {
        if tasks.is_empty() {
            debug!("No tasks to process");
            return None;
        }

        if self.running.swap(true, Ordering::SeqCst) {
            warn!("A batch is already converting, ignoring new request");
            return None;
        }
        let _guard = RunningGuard(&self.running);

        let started_at = Utc::now();
        let start = Instant::now();

        let classes: Vec<MediaClass> = tasks
            .iter()
            .map(|task| self.classifier.classify(&task.file_name()))
            .collect();
        let total_convertible = classes.iter().filter(|c| c.is_convertible()).count();

        self.state_tx.send_replace(BatchState {
            phase: BatchPhase::Converting,
            total_tasks: tasks.len(),
            total_convertible,
            ..Default::default()
        });
        info!(
            "Converting batch: {} tasks, {} convertible",
            tasks.len(),
            total_convertible
        );

        let mut records = Vec::with_capacity(tasks.len());
        for (task, class) in tasks.iter().zip(classes) {
            let outcome = self.process_task(task, class).await;
            self.state_tx.send_modify(|state| state.record(&outcome));
            records.push(TaskRecord {
                relative_path: task.relative_path.clone(),
                class,
                outcome,
            });
        }

        self.state_tx
            .send_modify(|state| state.phase = BatchPhase::Completed);
        let state = self.state();

        let report = BatchReport {
            total_tasks: state.total_tasks,
            total_convertible: state.total_convertible,
            converted: state.converted,
            skipped: state.skipped,
            failed: state.failed,
            tasks: records,
            started_at,
            finished_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!("{} ({} ms)", report, report.duration_ms);

        Some(report)
    }

    /// Visits one task. Never fails; errors become a `Failed` outcome.
    async fn process_task(&self, task: &ConversionTask, class: MediaClass) -> TaskOutcome {
        let Some(ext) = class.output_extension() else {
            debug!("Skipping unsupported file {}", task.relative_path);
            return TaskOutcome::Skipped;
        };

        match self.convert_task(task, class, ext).await {
            Ok(outcome) => {
                info!("Converted {}", task.relative_path);
                outcome
            }
            Err(e) => {
                warn!("Failed to convert {}: {}", task.relative_path, e);
                TaskOutcome::Failed(e.into())
            }
        }
    }

    async fn convert_task(
        &self,
        task: &ConversionTask,
        class: MediaClass,
        ext: &str,
    ) -> Result<TaskOutcome, TaskError> {
        // No conversion without confirmed write access
        self.ensure_permission(task.permission_target()).await?;

        let input = self.storage.read(&task.source).await?;
        debug!(
            "Read {} bytes from {}",
            input.len(),
            task.source.display()
        );

        let output = match class {
            MediaClass::Image => self.image.convert_image(&input).await?,
            MediaClass::Video => self.video.convert_video(&input).await?,
            MediaClass::Unsupported => return Ok(TaskOutcome::Skipped),
        };
        drop(input);

        let original_name = task.file_name();

        match &task.parent {
            Some(dir) => {
                let output_name = replace_extension(&original_name, ext);
                self.storage.write_entry(dir, &output_name, &output).await?;

                // The original goes only after the new entry is fully written
                let removed_original = !output_name.eq_ignore_ascii_case(&original_name);
                if removed_original {
                    self.storage.remove_entry(dir, &original_name).await?;
                }

                Ok(TaskOutcome::Converted {
                    output_name,
                    removed_original,
                })
            }
            None => {
                self.storage.overwrite(&task.source, &output).await?;

                if extension_of(&original_name).as_deref() != Some(ext) {
                    warn!(
                        "{} now holds {} content under its original name",
                        task.source.display(),
                        ext
                    );
                }

                Ok(TaskOutcome::Converted {
                    output_name: original_name,
                    removed_original: false,
                })
            }
        }
    }

    /// Queries write permission and asks for it when not yet granted.
    async fn ensure_permission(&self, target: &Path) -> Result<(), TaskError> {
        let state = match self.storage.query_permission(target).await? {
            PermissionState::Granted => PermissionState::Granted,
            _ => self.storage.request_permission(target).await?,
        };

        if state == PermissionState::Granted {
            Ok(())
        } else {
            Err(TaskError::PermissionDenied {
                path: target.to_path_buf(),
            })
        }
    }
}
