//! Codec module: the two conversion families.
//!
//! This module provides the [`ImageCodec`] and [`VideoCodec`] traits and
//! their FFmpeg-backed implementations.
//!
//! # Features
//!
//! - HEIC/HEIF/AVIF to JPEG (first frame only, fixed quality)
//! - MOV/QT/M4V to fast-start MP4
//! - One-time, retryable runtime initialization
//! - Scratch files that never outlive a call
//!
//! # Example
//!
//! ```ignore
//! use mediaswap_core::codec::{ConverterConfig, FfmpegVideoCodec, VideoCodec};
//!
//! let codec = FfmpegVideoCodec::new(ConverterConfig::default());
//! codec.ensure_initialized().await?;
//!
//! let mov = tokio::fs::read("clip.mov").await?;
//! let mp4 = codec.convert_video(&mov).await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod image_codec;
mod traits;
mod video_codec;

pub use config::ConverterConfig;
pub use error::CodecError;
pub use ffmpeg::FfmpegRuntime;
pub use image_codec::FfmpegImageCodec;
pub use traits::{ImageCodec, VideoCodec};
pub use video_codec::FfmpegVideoCodec;
