//! Shared FFmpeg process runtime for the codecs.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::ConverterConfig;
use super::error::CodecError;

/// Oldest release that composes HEIC/AVIF tile grids into one image.
const MIN_RELEASE: (u32, u32) = (7, 1);

/// Major and minor release from an `ffmpeg -version` banner.
///
/// Snapshot builds (`N-115000-g...`) carry no release number and yield `None`.
fn release_version(banner: &str) -> Option<(u32, u32)> {
    let token = banner
        .lines()
        .next()?
        .strip_prefix("ffmpeg version ")?
        .split_whitespace()
        .next()?;
    let mut parts = token
        .trim_start_matches('n')
        .split(|c: char| !c.is_ascii_digit());
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
    Some((major, minor))
}

/// Owns the ffmpeg binary location, the scratch directory and the
/// one-time initialization of both.
#[derive(Debug)]
pub struct FfmpegRuntime {
    config: ConverterConfig,
    initialized: OnceCell<()>,
}

impl FfmpegRuntime {
    /// Creates a runtime. Nothing is touched until first use.
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            initialized: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Whether initialization has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Checks the ffmpeg binary and creates the scratch directory, once.
    ///
    /// Concurrent callers wait on the same attempt. A failed attempt is not
    /// cached, so the next call tries again.
    pub async fn ensure_initialized(&self) -> Result<(), CodecError> {
        self.initialized
            .get_or_try_init(|| self.initialize())
            .await
            .map(|_| ())
    }

    async fn initialize(&self) -> Result<(), CodecError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(CodecError::initialization(format!(
                "'{} -version' exited with code: {:?}",
                self.config.ffmpeg_path.display(),
                output.status.code()
            )));
        }

        let banner = String::from_utf8_lossy(&output.stdout);
        let first_line = banner.lines().next().unwrap_or("unknown version");
        match release_version(&banner) {
            Some(version) if version < MIN_RELEASE => {
                return Err(CodecError::initialization(format!(
                    "{} is too old, {}.{} or newer is required to decode tiled HEIC/AVIF images",
                    first_line, MIN_RELEASE.0, MIN_RELEASE.1
                )));
            }
            Some(_) => {}
            None if first_line.starts_with("ffmpeg version") => {
                warn!(
                    "Could not read FFmpeg release from '{}', assuming a recent build",
                    first_line
                );
            }
            None => {
                return Err(CodecError::initialization(format!(
                    "'{} -version' did not identify as ffmpeg",
                    self.config.ffmpeg_path.display()
                )));
            }
        }

        tokio::fs::create_dir_all(&self.config.temp_dir)
            .await
            .map_err(|e| {
                CodecError::initialization(format!(
                    "failed to create scratch directory {}: {}",
                    self.config.temp_dir.display(),
                    e
                ))
            })?;

        info!("FFmpeg ready: {}", first_line);
        Ok(())
    }

    fn spawn_error(&self, e: std::io::Error) -> CodecError {
        if e.kind() == std::io::ErrorKind::NotFound {
            CodecError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            CodecError::Io(e)
        }
    }

    /// A collision-free path inside the scratch directory.
    pub fn scratch_path(&self, ext: &str) -> PathBuf {
        self.config
            .temp_dir
            .join(format!("{}.{}", Uuid::new_v4().simple(), ext))
    }

    /// Arguments every invocation starts with.
    pub fn base_args(&self) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(), // Overwrite output
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]
    }

    /// Runs ffmpeg with `args` and returns its stdout.
    ///
    /// The process is killed if it outlives the configured timeout.
    pub async fn run(&self, args: &[String]) -> Result<Vec<u8>, CodecError> {
        debug!("Running ffmpeg {}", args.join(" "));

        let child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(CodecError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CodecError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        Ok(output.stdout)
    }

    /// Removes scratch files. Missing files are fine; other failures are
    /// logged and otherwise ignored.
    pub async fn cleanup(&self, paths: &[&Path]) {
        for path in paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove scratch file {}: {}", path.display(), e),
            }
        }
    }
}
