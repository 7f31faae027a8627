//! FFmpeg-backed video codec.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use super::config::ConverterConfig;
use super::error::CodecError;
use super::ffmpeg::FfmpegRuntime;
use super::traits::VideoCodec;

/// Transcodes device video containers to fast-start MP4 through scratch files.
#[derive(Debug)]
pub struct FfmpegVideoCodec {
    runtime: FfmpegRuntime,
}

impl FfmpegVideoCodec {
    /// Creates a new video codec with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            runtime: FfmpegRuntime::new(config),
        }
    }

    /// Creates a codec with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds ffmpeg arguments for MP4 output.
    fn build_transcode_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        let config = self.runtime.config();
        let mut args = self.runtime.base_args();
        args.extend(["-i".to_string(), input_path.to_string_lossy().to_string()]);

        // Codec selection
        args.extend(config.video_codec_args.iter().cloned());

        // Moov atom up front for streaming-friendly output
        args.extend(["-movflags".to_string(), "+faststart".to_string()]);

        // Extra args
        args.extend(config.extra_ffmpeg_args.iter().cloned());

        args.extend([
            "-f".to_string(),
            "mp4".to_string(),
            output_path.to_string_lossy().to_string(),
        ]);
        args
    }
}

#[async_trait]
impl VideoCodec for FfmpegVideoCodec {
    fn name(&self) -> &str {
        "ffmpeg-video"
    }

    async fn ensure_initialized(&self) -> Result<(), CodecError> {
        self.runtime.ensure_initialized().await
    }

    async fn convert_video(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.ensure_initialized().await?;

        let input_path = self.runtime.scratch_path("in");
        let output_path = self.runtime.scratch_path("mp4");

        let result = async {
            tokio::fs::write(&input_path, input).await?;
            self.runtime
                .run(&self.build_transcode_args(&input_path, &output_path))
                .await?;
            Ok::<Vec<u8>, CodecError>(tokio::fs::read(&output_path).await?)
        }
        .await;

        // Scratch files go regardless of outcome
        self.runtime.cleanup(&[&input_path, &output_path]).await;

        let output = result?;
        if output.is_empty() {
            return Err(CodecError::EmptyOutput);
        }
        debug!(
            "Transcoded {} input bytes to {} MP4 bytes",
            input.len(),
            output.len()
        );
        Ok(output)
    }
}
