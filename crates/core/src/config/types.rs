use serde::{Deserialize, Serialize};

use crate::codec::ConverterConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub formats: FormatsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Image output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    /// JPEG quality on a 0-1 scale.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_jpeg_quality() -> f32 {
    0.9
}

/// Recognized source formats, by lowercase extension.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatsConfig {
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
            video_extensions: default_video_extensions(),
        }
    }
}

fn default_image_extensions() -> Vec<String> {
    ["heic", "heif", "heics", "avif"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_video_extensions() -> Vec<String> {
    ["mov", "qt", "m4v"].iter().map(|s| s.to_string()).collect()
}

/// Filesystem access configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Whether a permission request may add the owner write bit to a
    /// read-only file or directory.
    #[serde(default)]
    pub grant_write_access: bool,
}
