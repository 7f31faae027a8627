//! Storage module: file access and in-place write-back.
//!
//! The engine never touches the filesystem directly. Every permission
//! check, read, write and removal goes through a [`Storage`], so tests can
//! substitute an in-memory implementation.

mod error;
mod fs_storage;
mod traits;

pub use error::StorageError;
pub use fs_storage::FsStorage;
pub use traits::{PermissionState, Storage};
