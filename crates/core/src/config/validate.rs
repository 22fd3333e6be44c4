use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Pipeline retry attempts and key URL template
/// - Transcoder timeout and CRF range
/// - Worker concurrency
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pipeline.attempts_max == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.attempts_max cannot be 0".to_string(),
        ));
    }

    if !config.pipeline.key_url_template.contains("{lesson_id}") {
        return Err(ConfigError::ValidationError(
            "pipeline.key_url_template must contain {lesson_id}".to_string(),
        ));
    }

    if config.transcoder.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.timeout_secs cannot be 0".to_string(),
        ));
    }

    // x264 accepts 0..=51
    if config.transcoder.crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "transcoder.crf must be at most 51, got {}",
            config.transcoder.crf
        )));
    }

    if config.worker.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "worker.max_concurrent cannot be 0".to_string(),
        ));
    }

    Ok(())
}
