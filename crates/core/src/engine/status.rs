//! One-line status text for presentation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{BatchPhase, BatchState};

/// What the user should be told right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchStatus {
    /// Nothing selected yet.
    #[default]
    Idle,
    /// A selection is being discovered.
    Scanning,
    /// Tasks are loaded and waiting.
    Loaded { files: usize, convertible: usize },
    /// A batch is converting.
    Converting { done: usize, total: usize },
    /// The last batch finished.
    Done {
        converted: usize,
        skipped: usize,
        failed: usize,
    },
    /// The requested operation is not possible here.
    Unsupported { message: String },
}

impl BatchStatus {
    /// Status derived from an engine snapshot, when a batch has run.
    pub fn from_state(state: &BatchState) -> Option<Self> {
        match state.phase {
            BatchPhase::Idle => None,
            BatchPhase::Converting => Some(BatchStatus::Converting {
                done: state.processed(),
                total: state.total_tasks,
            }),
            BatchPhase::Completed => Some(BatchStatus::Done {
                converted: state.converted,
                skipped: state.skipped,
                failed: state.failed,
            }),
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Idle => write!(f, "No folder selected"),
            BatchStatus::Scanning => write!(f, "Scanning..."),
            BatchStatus::Loaded { files, convertible } => write!(
                f,
                "Loaded {} files ({} convertible)",
                files, convertible
            ),
            BatchStatus::Converting { done, total } => {
                write!(f, "Converting... {}/{}", done, total)
            }
            BatchStatus::Done {
                converted,
                skipped,
                failed,
            } => write!(
                f,
                "Done: converted {}, skipped {}, failed {}",
                converted, skipped, failed
            ),
            BatchStatus::Unsupported { message } => write!(f, "Not supported: {}", message),
        }
    }
}
