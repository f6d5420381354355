//! FFmpeg-based encoder implementation.

use async_trait::async_trait;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

use super::config::EncoderConfig;
use super::error::EncoderError;
use super::traits::Encoder;
use super::types::{Bitrate, ConversionTask};

/// Encoder that shells out to the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Translates a user bitrate into ffmpeg's `-b:a` form (`192kbps` → `192k`).
    pub fn ffmpeg_bitrate(bitrate: &Bitrate) -> String {
        format!("{}k", bitrate.kbps())
    }

    /// Builds ffmpeg arguments for one conversion.
    fn build_args(&self, task: &ConversionTask) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            // Without -y ffmpeg would prompt on an existing output; -n refuses instead.
            if self.config.overwrite { "-y" } else { "-n" }.to_string(),
            "-i".to_string(),
            task.input_path.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-c:a".to_string(),
            task.format.ffmpeg_codec().to_string(),
        ];

        if !task.format.is_lossless() {
            args.extend(["-b:a".to_string(), Self::ffmpeg_bitrate(&task.bitrate)]);
        }

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(task.output_path.to_string_lossy().to_string());

        args
    }

    /// Picks the most useful diagnostic out of a failed run.
    fn failure_message(output: &Output) -> String {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }

        // Some builds print errors on stdout.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }

        match output.status.code() {
            Some(code) => format!("ffmpeg exited with code {}", code),
            None => "ffmpeg was terminated by a signal".to_string(),
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> EncoderError {
        if e.kind() == std::io::ErrorKind::NotFound {
            EncoderError::EncoderNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            EncoderError::Io(e)
        }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(&self, task: &ConversionTask) -> Result<String, EncoderError> {
        let args = self.build_args(task);
        debug!(ffmpeg = %self.config.ffmpeg_path.display(), ?args, "Running ffmpeg");

        // A dropped future (e.g. a batch-level timeout) must not leave ffmpeg behind.
        let output = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(EncoderError::conversion_failed(
                Self::failure_message(&output),
                output.status.code(),
            ));
        }

        Ok(format!(
            "Successfully converted '{}' to '{}'",
            task.input_path.display(),
            task.output_path.display()
        ))
    }

    async fn validate(&self) -> Result<(), EncoderError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(EncoderError::conversion_failed(
                Self::failure_message(&output),
                output.status.code(),
            ));
        }

        Ok(())
    }
}
