use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Retry and polling bounds are non-zero
/// - Knowledge-base thresholds are within 0-100
/// - At least one OCR provider can run
/// - Substitution result cap is non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.polling.max_attempts == 0 || config.polling.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "polling.interval_ms and polling.max_attempts must be positive".to_string(),
        ));
    }

    let threshold = config.assistant.kb_min_confidence;
    if !(0.0..=100.0).contains(&threshold) {
        return Err(ConfigError::ValidationError(format!(
            "assistant.kb_min_confidence must be within 0-100, got {}",
            threshold
        )));
    }

    let fallback = config.ocr.fallback_confidence;
    if !(0.0..=100.0).contains(&fallback) {
        return Err(ConfigError::ValidationError(format!(
            "ocr.fallback_confidence must be within 0-100, got {}",
            fallback
        )));
    }

    if !config.ocr.has_any_provider() {
        return Err(ConfigError::ValidationError(
            "ocr: every provider is disabled; enable local_fallback or configure a provider"
                .to_string(),
        ));
    }

    if config.substitution.max_results == 0 {
        return Err(ConfigError::ValidationError(
            "substitution.max_results cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OcrConfig, ServerConfig};
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_retry_attempts_fails() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(msg)) if msg.contains("retry")
        ));
    }

    #[test]
    fn test_validate_zero_polling_fails() {
        let mut config = Config::default();
        config.polling.interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_threshold_out_of_range_fails() {
        let mut config = Config::default();
        config.assistant.kb_min_confidence = 120.0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(msg)) if msg.contains("kb_min_confidence")
        ));
    }

    #[test]
    fn test_validate_all_ocr_disabled_fails() {
        let config = Config {
            ocr: OcrConfig {
                local_fallback: false,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(msg)) if msg.starts_with("ocr")
        ));
    }

    #[test]
    fn test_validate_zero_max_results_fails() {
        let mut config = Config::default();
        config.substitution.max_results = 0;
        assert!(validate_config(&config).is_err());
    }
}
