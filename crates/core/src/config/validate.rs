use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - batch.max_workers, when set, is at least 1
/// - batch.input_extensions is non-empty with no blank entries
/// - encoder.ffmpeg_path is not empty
/// - settings.path is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.batch.max_workers == Some(0) {
        return Err(ConfigError::ValidationError(
            "batch.max_workers must be at least 1".to_string(),
        ));
    }

    if config.batch.input_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "batch.input_extensions cannot be empty".to_string(),
        ));
    }

    if config
        .batch
        .input_extensions
        .iter()
        .any(|ext| ext.trim_start_matches('.').trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "batch.input_extensions cannot contain blank entries".to_string(),
        ));
    }

    if config.encoder.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "encoder.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    if config.settings.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "settings.path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
