//! FFmpeg-backed image codec.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

use super::config::ConverterConfig;
use super::error::CodecError;
use super::ffmpeg::FfmpegRuntime;
use super::traits::ImageCodec;
use crate::config::ImageConfig;

/// Decodes device images with ffmpeg and re-encodes the first frame as JPEG.
#[derive(Debug)]
pub struct FfmpegImageCodec {
    runtime: FfmpegRuntime,
    quality: u8,
}

impl FfmpegImageCodec {
    /// Creates a new image codec.
    pub fn new(config: ConverterConfig, image: &ImageConfig) -> Self {
        Self {
            runtime: FfmpegRuntime::new(config),
            quality: jpeg_quality(image.jpeg_quality),
        }
    }

    /// Creates a codec with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default(), &ImageConfig::default())
    }

    /// JPEG quality on the encoder's 1-100 scale.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Builds ffmpeg arguments that write the first frame of the primary
    /// image to stdout as PNG.
    ///
    /// No stream is mapped explicitly. Tiled HEIC/AVIF files store each
    /// tile as its own stream, and only default selection picks the
    /// composed grid.
    fn build_decode_args(&self, input_path: &Path) -> Vec<String> {
        let mut args = self.runtime.base_args();
        args.extend([
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
        ]);
        args.extend(self.runtime.config().extra_ffmpeg_args.iter().cloned());
        args.extend([
            "-f".to_string(),
            "image2pipe".to_string(),
            "-c:v".to_string(),
            "png".to_string(),
            "pipe:1".to_string(),
        ]);
        args
    }

    async fn decode_to_png(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let input_path = self.runtime.scratch_path("in");

        let result = async {
            tokio::fs::write(&input_path, input).await?;
            self.runtime.run(&self.build_decode_args(&input_path)).await
        }
        .await;

        self.runtime.cleanup(&[&input_path]).await;
        result
    }
}

/// Maps a 0-1 quality onto the encoder's 1-100 scale.
fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encodes a PNG raster as JPEG. Alpha is dropped.
pub(crate) fn encode_jpeg(png: &[u8], quality: u8) -> Result<Vec<u8>, CodecError> {
    let decoded = image::load_from_memory_with_format(png, ImageFormat::Png).map_err(|e| {
        CodecError::Decode {
            reason: e.to_string(),
        }
    })?;
    let rgb = decoded.to_rgb8();

    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CodecError::Encode {
            reason: e.to_string(),
        })?;

    Ok(output)
}

#[async_trait]
impl ImageCodec for FfmpegImageCodec {
    fn name(&self) -> &str {
        "ffmpeg-image"
    }

    async fn ensure_initialized(&self) -> Result<(), CodecError> {
        self.runtime.ensure_initialized().await
    }

    async fn convert_image(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.ensure_initialized().await?;

        let png = self.decode_to_png(input).await?;
        if png.is_empty() {
            return Err(CodecError::EmptyOutput);
        }
        debug!("Decoded {} input bytes to {} PNG bytes", input.len(), png.len());

        let quality = self.quality;
        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&png, quality))
            .await
            .map_err(|e| CodecError::Encode {
                reason: e.to_string(),
            })??;

        if jpeg.is_empty() {
            return Err(CodecError::EmptyOutput);
        }
        Ok(jpeg)
    }
}
