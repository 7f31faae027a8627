pub mod classify;
pub mod codec;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod paths;
pub mod selection;
pub mod storage;
pub mod testing;

pub use classify::{Classifier, MediaClass};
pub use codec::{
    CodecError, ConverterConfig, FfmpegImageCodec, FfmpegRuntime, FfmpegVideoCodec, ImageCodec,
    VideoCodec,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, FormatsConfig, ImageConfig, StorageConfig,
};
pub use discovery::{discover, DiscoveryError};
pub use engine::{
    BatchPhase, BatchReport, BatchState, BatchStatus, ConversionEngine, ConversionTask,
    FailureKind, Session, TaskError, TaskFailure, TaskOutcome, TaskRecord,
};
pub use selection::{drop_entries, select_files, select_folder, SelectionError};
pub use storage::{FsStorage, PermissionState, Storage, StorageError};
