use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides, e.g. `MEDIASWAP_IMAGE__JPEG_QUALITY`.
const ENV_PREFIX: &str = "MEDIASWAP_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from defaults, an optional file and the environment.
///
/// A missing file is not an error here; the defaults are used instead.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[image]
jpeg_quality = 0.8
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!((config.image.jpeg_quality - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[image]
jpeg_quality = "high"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/mediaswap.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[converter]
ffmpeg_path = "/usr/local/bin/ffmpeg"

[storage]
grant_write_access = true
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(
            config.converter.ffmpeg_path.to_str().unwrap(),
            "/usr/local/bin/ffmpeg"
        );
        assert!(config.storage.grant_write_access);
        assert_eq!(config.formats.video_extensions.len(), 3);
    }

    #[test]
    fn test_load_config_or_default_without_file() {
        let config = load_config_or_default(Some(Path::new("/nonexistent/mediaswap.toml")))
            .unwrap();
        assert_eq!(config.formats.image_extensions.len(), 4);
    }
}
