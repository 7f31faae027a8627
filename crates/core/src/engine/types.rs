//! Types for the conversion engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::classify::MediaClass;
use crate::codec::CodecError;
use crate::paths::file_name_of;
use crate::storage::StorageError;

/// One candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTask {
    /// The original file.
    pub source: PathBuf,
    /// Directory that directly holds the file. Present only for tasks found
    /// by folder discovery.
    pub parent: Option<PathBuf>,
    /// Slash-separated path from the scan origin, for reporting only.
    pub relative_path: String,
}

impl ConversionTask {
    /// A task found inside `parent` during discovery.
    pub fn from_discovery(source: PathBuf, parent: PathBuf, relative_path: String) -> Self {
        Self {
            source,
            parent: Some(parent),
            relative_path,
        }
    }

    /// A task picked directly, with no known container.
    pub fn from_selection(source: PathBuf) -> Self {
        let relative_path =
            file_name_of(&source).unwrap_or_else(|| source.to_string_lossy().into_owned());
        Self {
            source,
            parent: None,
            relative_path,
        }
    }

    /// File name of the source.
    pub fn file_name(&self) -> String {
        file_name_of(&self.source).unwrap_or_else(|| self.relative_path.clone())
    }

    /// Where write permission has to be held: the container if known,
    /// otherwise the file itself.
    pub fn permission_target(&self) -> &Path {
        self.parent.as_deref().unwrap_or(&self.source)
    }
}

/// Phase of the current batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    /// No batch has run yet.
    #[default]
    Idle,
    /// A batch is in flight.
    Converting,
    /// The last batch visited every task.
    Completed,
}

/// Progress of one batch, published after every task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    pub phase: BatchPhase,
    /// All tasks in the batch, convertible or not.
    pub total_tasks: usize,
    /// Tasks whose class is not unsupported.
    pub total_convertible: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchState {
    pub fn is_running(&self) -> bool {
        self.phase == BatchPhase::Converting
    }

    /// Tasks that have reached an outcome so far.
    pub fn processed(&self) -> usize {
        self.converted + self.skipped + self.failed
    }

    /// Counts one outcome.
    pub fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Converted { .. } => self.converted += 1,
            TaskOutcome::Skipped => self.skipped += 1,
            TaskOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Why a task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PermissionDenied,
    Codec,
    Storage,
}

/// A recorded task failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Result of visiting one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Converted and written back.
    Converted {
        /// Name the converted content lives under.
        output_name: String,
        /// Whether the original entry was removed.
        removed_original: bool,
    },
    /// Not convertible; nothing was touched.
    Skipped,
    /// Conversion or write-back failed.
    Failed(TaskFailure),
}

/// Errors raised while converting a single task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Write permission was not granted.
    #[error("write permission not granted for {path}")]
    PermissionDenied { path: PathBuf },

    /// A codec rejected the item.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Reading or writing the file failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TaskError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TaskError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            TaskError::Codec(_) => FailureKind::Codec,
            TaskError::Storage(_) => FailureKind::Storage,
        }
    }
}

impl From<TaskError> for TaskFailure {
    fn from(err: TaskError) -> Self {
        TaskFailure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one task, for the final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub relative_path: String,
    pub class: MediaClass,
    pub outcome: TaskOutcome,
}

/// Final tally of a completed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub total_tasks: usize,
    pub total_convertible: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub tasks: Vec<TaskRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done: converted {}, skipped {}, failed {}",
            self.converted, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_task_has_no_parent() {
        let task = ConversionTask::from_selection(PathBuf::from("/photos/IMG_1.HEIC"));
        assert!(task.parent.is_none());
        assert_eq!(task.relative_path, "IMG_1.HEIC");
        assert_eq!(task.permission_target(), Path::new("/photos/IMG_1.HEIC"));
    }

    #[test]
    fn test_discovery_task_targets_parent() {
        let task = ConversionTask::from_discovery(
            PathBuf::from("/root/a/b/photo.heic"),
            PathBuf::from("/root/a/b"),
            "a/b/photo.heic".to_string(),
        );
        assert_eq!(task.permission_target(), Path::new("/root/a/b"));
        assert_eq!(task.file_name(), "photo.heic");
    }

    #[test]
    fn test_batch_state_record() {
        let mut state = BatchState::default();
        state.record(&TaskOutcome::Skipped);
        state.record(&TaskOutcome::Converted {
            output_name: "a.jpg".to_string(),
            removed_original: true,
        });
        state.record(&TaskOutcome::Failed(TaskFailure {
            kind: FailureKind::Codec,
            message: "bad".to_string(),
        }));
        assert_eq!(state.converted, 1);
        assert_eq!(state.skipped, 1);
        assert_eq!(state.failed, 1);
        assert_eq!(state.processed(), 3);
        assert!(!state.is_running());
    }

    #[test]
    fn test_task_error_kind() {
        let err = TaskError::PermissionDenied {
            path: PathBuf::from("/x"),
        };
        let failure = TaskFailure::from(err);
        assert_eq!(failure.kind, FailureKind::PermissionDenied);
        assert!(failure.message.contains("/x"));

        let failure = TaskFailure::from(TaskError::Codec(CodecError::EmptyOutput));
        assert_eq!(failure.kind, FailureKind::Codec);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = TaskOutcome::Converted {
            output_name: "clip.mp4".to_string(),
            removed_original: true,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"converted\""));
        assert!(json.contains("\"output_name\":\"clip.mp4\""));
    }
}
