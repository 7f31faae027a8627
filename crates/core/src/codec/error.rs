//! Error types for the codec module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting a single item.
#[derive(Debug, Error)]
pub enum CodecError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// The codec runtime could not be brought up.
    #[error("Codec initialization failed: {reason}")]
    Initialization { reason: String },

    /// The external process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Decoded frame could not be read as a raster image.
    #[error("Failed to decode image: {reason}")]
    Decode { reason: String },

    /// Raster image could not be encoded.
    #[error("Failed to encode image: {reason}")]
    Encode { reason: String },

    /// The codec produced no bytes.
    #[error("Codec produced empty output")]
    EmptyOutput,

    /// I/O error on a scratch file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new initialization error.
    pub fn initialization(reason: impl Into<String>) -> Self {
        Self::Initialization {
            reason: reason.into(),
        }
    }
}
