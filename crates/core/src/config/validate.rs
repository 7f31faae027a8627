use std::collections::HashSet;

use super::{types::Config, ConfigError};
use crate::classify::MediaClass;

/// Classes whose output extension may not be used as an input. Accepting
/// one would convert outputs again on every run.
const CONVERTED_CLASSES: [MediaClass; 2] = [MediaClass::Image, MediaClass::Video];

/// Validate configuration
/// Currently validates:
/// - JPEG quality lies in (0, 1]
/// - Conversion timeout is not 0
/// - Extension sets are non-empty, well formed and disjoint
/// - No input extension is an output extension (`jpg`, `mp4`)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let quality = config.image.jpeg_quality;
    if !(quality > 0.0 && quality <= 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "image.jpeg_quality must be in (0, 1], got {}",
            quality
        )));
    }

    if config.converter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0".to_string(),
        ));
    }

    let images = extension_set("formats.image_extensions", &config.formats.image_extensions)?;
    let videos = extension_set("formats.video_extensions", &config.formats.video_extensions)?;

    if let Some(shared) = images.intersection(&videos).next() {
        return Err(ConfigError::ValidationError(format!(
            "extension '{}' is listed as both image and video",
            shared
        )));
    }

    Ok(())
}

fn extension_set(field: &str, extensions: &[String]) -> Result<HashSet<String>, ConfigError> {
    if extensions.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{} cannot be empty",
            field
        )));
    }

    let mut set = HashSet::new();
    for ext in extensions {
        if ext.is_empty() || ext.contains('.') {
            return Err(ConfigError::ValidationError(format!(
                "{} contains invalid extension '{}'",
                field, ext
            )));
        }
        let ext = ext.to_ascii_lowercase();
        if CONVERTED_CLASSES
            .iter()
            .any(|class| class.output_extension() == Some(ext.as_str()))
        {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot contain output extension '{}'",
                field, ext
            )));
        }
        set.insert(ext);
    }
    Ok(set)
}
