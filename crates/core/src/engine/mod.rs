//! Conversion engine: the batch state machine.
//!
//! A batch moves `Idle -> Converting -> Completed`. Each task is classified,
//! checked for write permission, read, converted by the matching codec and
//! written back in place. Every task ends in exactly one of converted,
//! skipped or failed, and a failing task never aborts the batch.
//!
//! # Example
//!
//! ```ignore
//! use mediaswap_core::{
//!     Classifier, ConversionEngine, FfmpegImageCodec, FfmpegVideoCodec, FsStorage,
//! };
//!
//! let engine = ConversionEngine::new(
//!     Classifier::default(),
//!     FfmpegImageCodec::with_defaults(),
//!     FfmpegVideoCodec::with_defaults(),
//!     FsStorage::with_defaults(),
//! );
//!
//! let mut progress = engine.subscribe();
//! tokio::spawn(async move {
//!     while progress.changed().await.is_ok() {
//!         println!("{:?}", *progress.borrow());
//!     }
//! });
//!
//! if let Some(report) = engine.process_items(&tasks).await {
//!     println!("{}", report);
//! }
//! ```

mod runner;
mod session;
mod status;
mod types;

pub use runner::ConversionEngine;
pub use session::Session;
pub use status::BatchStatus;
pub use types::{
    BatchPhase, BatchReport, BatchState, ConversionTask, FailureKind, TaskError, TaskFailure,
    TaskOutcome, TaskRecord,
};
