//! Error taxonomy shared by every external provider call.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to an external provider.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// Network failure, timeout or malformed payload. Retryable.
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Non-success HTTP status other than rate limiting. Retryable.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The provider kept answering 429 until the policy ran out of attempts.
    #[error("Rate limit exceeded{}", retry_after_suffix(.retry_after))]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Malformed identifier or input format. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An asynchronous job was reported as failed by the provider.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// An asynchronous job was still running after the polling bound.
    #[error("Job timed out after {attempts} polls")]
    JobTimeout { attempts: u32 },

    /// Provider credentials or endpoint are missing.
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Every candidate provider failed.
    #[error("All providers exhausted")]
    AllProvidersExhausted,
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

impl ProviderError {
    /// Whether the retry executor may try the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transient(_)
                | ProviderError::Api { .. }
                | ProviderError::RateLimitExceeded { .. }
        )
    }

    /// Stable label for metrics and telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Transient(_) => "transient",
            ProviderError::Api { .. } => "api",
            ProviderError::RateLimitExceeded { .. } => "rate_limited",
            ProviderError::InvalidInput(_) => "invalid_input",
            ProviderError::JobFailed(_) => "job_failed",
            ProviderError::JobTimeout { .. } => "job_timeout",
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::AllProvidersExhausted => "exhausted",
        }
    }

    /// Shorthand for a payload that failed the expected-shape check.
    pub fn malformed(provider: &str, detail: impl std::fmt::Display) -> Self {
        ProviderError::Transient(format!("malformed {} payload: {}", provider, detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - unavailable");

        let err = ProviderError::RateLimitExceeded {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded, retry after 7s");

        let err = ProviderError::RateLimitExceeded { retry_after: None };
        assert_eq!(err.to_string(), "Rate limit exceeded");

        let err = ProviderError::JobTimeout { attempts: 30 };
        assert_eq!(err.to_string(), "Job timed out after 30 polls");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Transient("reset".into()).is_retryable());
        assert!(ProviderError::Api {
            status: 500,
            message: String::new()
        }
        .is_retryable());
        assert!(ProviderError::RateLimitExceeded { retry_after: None }.is_retryable());

        assert!(!ProviderError::InvalidInput("bad".into()).is_retryable());
        assert!(!ProviderError::JobTimeout { attempts: 30 }.is_retryable());
        assert!(!ProviderError::JobFailed("x".into()).is_retryable());
        assert!(!ProviderError::AllProvidersExhausted.is_retryable());
    }

    #[test]
    fn test_malformed_is_transient() {
        let err = ProviderError::malformed("vision", "missing responses");
        assert_eq!(err.kind(), "transient");
        assert!(err.to_string().contains("missing responses"));
    }
}
