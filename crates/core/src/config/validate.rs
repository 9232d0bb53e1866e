use super::{types::Config, ConfigError};
use crate::encoder::FFMPEG_LOG_LEVELS;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Encoder path is set, log level is one ffmpeg knows, timeout is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.encoder.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "encoder.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    if !FFMPEG_LOG_LEVELS.contains(&config.encoder.log_level.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "encoder.log_level must be one of {}, got '{}'",
            FFMPEG_LOG_LEVELS.join(", "),
            config.encoder.log_level
        )));
    }

    if config.encoder.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
