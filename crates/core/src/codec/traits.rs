//! Trait definitions for the codec module.

use async_trait::async_trait;

use super::error::CodecError;

/// Converts device image formats to JPEG.
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Returns the name of this codec implementation.
    fn name(&self) -> &str;

    /// Brings the codec up. Runs at most once successfully; later calls are
    /// no-ops, and a failed attempt is retried on the next call.
    async fn ensure_initialized(&self) -> Result<(), CodecError>;

    /// Converts an image blob into JPEG bytes.
    ///
    /// Multi-frame sources yield their first frame.
    async fn convert_image(&self, input: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Converts device video containers to MP4.
#[async_trait]
pub trait VideoCodec: Send + Sync {
    /// Returns the name of this codec implementation.
    fn name(&self) -> &str;

    /// Brings the codec up. Same contract as [`ImageCodec::ensure_initialized`].
    async fn ensure_initialized(&self) -> Result<(), CodecError>;

    /// Converts a video blob into fast-start MP4 bytes.
    async fn convert_video(&self, input: &[u8]) -> Result<Vec<u8>, CodecError>;
}
