//! Extension based classification of conversion candidates.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::FormatsConfig;
use crate::paths::extension_of;

/// Conversion family of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaClass {
    /// Device image format, converted to JPEG.
    Image,
    /// Device video container, converted to MP4.
    Video,
    /// Anything else; never touched.
    Unsupported,
}

impl MediaClass {
    /// Extension of the converted output.
    pub fn output_extension(&self) -> Option<&'static str> {
        match self {
            MediaClass::Image => Some("jpg"),
            MediaClass::Video => Some("mp4"),
            MediaClass::Unsupported => None,
        }
    }

    pub fn is_convertible(&self) -> bool {
        !matches!(self, MediaClass::Unsupported)
    }
}

/// Maps file names to a [`MediaClass`].
#[derive(Debug, Clone)]
pub struct Classifier {
    image_extensions: HashSet<String>,
    video_extensions: HashSet<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&FormatsConfig::default())
    }
}

impl Classifier {
    /// Builds a classifier from the configured extension sets.
    pub fn from_config(formats: &FormatsConfig) -> Self {
        Self::new(
            formats.image_extensions.iter().map(String::as_str),
            formats.video_extensions.iter().map(String::as_str),
        )
    }

    pub fn new<'a>(
        images: impl IntoIterator<Item = &'a str>,
        videos: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            image_extensions: images.into_iter().map(|e| e.to_ascii_lowercase()).collect(),
            video_extensions: videos.into_iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    /// Classifies a file by the extension of its name, case-insensitively.
    pub fn classify(&self, file_name: &str) -> MediaClass {
        match extension_of(file_name) {
            Some(ext) if self.image_extensions.contains(&ext) => MediaClass::Image,
            Some(ext) if self.video_extensions.contains(&ext) => MediaClass::Video,
            _ => MediaClass::Unsupported,
        }
    }
}
