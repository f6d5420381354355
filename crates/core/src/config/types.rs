use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::batch::BatchConfig;
use crate::encoder::EncoderConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where remembered preferences live
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("config.json")
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::AudioFormat;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.settings.path, PathBuf::from("config.json"));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
[encoder]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
overwrite = true
extra_ffmpeg_args = ["-ar", "44100"]

[batch]
max_workers = 4
target_format = "ogg_vorbis"
task_timeout_secs = 0
input_extensions = ["opus", "flac"]

[settings]
path = "/home/user/.transcoda.json"

[logging]
level = "debug"
json = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.encoder.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert!(config.encoder.overwrite);
        assert_eq!(config.encoder.extra_ffmpeg_args, vec!["-ar", "44100"]);
        assert_eq!(config.batch.max_workers, Some(4));
        assert_eq!(config.batch.target_format, AudioFormat::OggVorbis);
        assert!(config.batch.task_timeout().is_none());
        assert_eq!(config.batch.input_extensions, vec!["opus", "flac"]);
        assert_eq!(config.settings.path, PathBuf::from("/home/user/.transcoda.json"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }
}
