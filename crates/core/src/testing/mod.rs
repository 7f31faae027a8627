//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the codec and storage
//! traits, so the engine can be exercised without ffmpeg or a real
//! filesystem.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediaswap_core::testing::{MockCodec, MockStorage};
//!
//! let storage = MockStorage::new();
//! storage.add_file("/photos/img.heic", b"heic").await;
//!
//! let codec = MockCodec::new();
//! codec.fail_on_input(b"broken").await;
//!
//! let engine = ConversionEngine::new(Classifier::default(), codec.clone(), codec, storage);
//! ```

mod mock_codec;
mod mock_storage;

pub use mock_codec::{CodecCall, MockCodec};
pub use mock_storage::{MockStorage, StorageOp};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::PathBuf;

    use crate::engine::ConversionTask;

    /// A task found by folder discovery, rooted at `/library`.
    pub fn folder_task(relative_path: &str) -> ConversionTask {
        let source = PathBuf::from("/library").join(relative_path);
        let parent = source
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("/library"));
        ConversionTask::from_discovery(source, parent, relative_path.to_string())
    }

    /// A directly picked file with no container.
    pub fn selected_task(path: &str) -> ConversionTask {
        ConversionTask::from_selection(PathBuf::from(path))
    }
}
