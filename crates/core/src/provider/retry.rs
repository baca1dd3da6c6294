//! Retry executor with exponential backoff and rate-limit awareness.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::transport::redacted_url;
use super::{HttpReply, HttpRequest, HttpTransport, ProviderError};
use crate::metrics::{PROVIDER_DURATION, PROVIDER_REQUESTS, PROVIDER_RETRIES};

/// How many times a logical request may hit the network, and how long to
/// wait in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum network calls for one logical request.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff unit. Attempt `n` waits `2^n * base_delay_ms`.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
        }
    }

    /// One shot, no retries.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Computed delay before attempt `attempt` (0-based). Attempt 0 never waits.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Issues provider calls under a [`RetryPolicy`].
///
/// A successful reply short-circuits. A 429 reply makes the next wait honor
/// the server's `retry-after` hint instead of the computed backoff; on the
/// last allowed attempt it fails with `RateLimitExceeded`. Any other
/// failure consumes an attempt, and the last error is surfaced once the
/// policy is exhausted.
#[derive(Clone)]
pub struct RetryExecutor {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Same transport, different policy.
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy,
        }
    }

    /// Underlying transport, for callers that poll without retrying.
    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Execute `request`, returning the first successful reply.
    pub async fn execute(
        &self,
        provider: &str,
        request: &HttpRequest,
    ) -> Result<HttpReply, ProviderError> {
        self.execute_parsed(provider, request, Ok).await
    }

    /// Execute `request` and run `parse` on each successful reply.
    ///
    /// A retryable parse error (a malformed payload) consumes the attempt
    /// like a failed call; a non-retryable one is returned as is.
    pub async fn execute_parsed<T, F>(
        &self,
        provider: &str,
        request: &HttpRequest,
        parse: F,
    ) -> Result<T, ProviderError>
    where
        F: Fn(HttpReply) -> Result<T, ProviderError>,
    {
        let start = Instant::now();
        let result = self.execute_inner(provider, request, parse).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(ProviderError::RateLimitExceeded { .. }) => "rate_limited",
            Err(_) => "error",
        };
        PROVIDER_REQUESTS
            .with_label_values(&[provider, outcome])
            .inc();
        PROVIDER_DURATION
            .with_label_values(&[provider])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn execute_inner<T, F>(
        &self,
        provider: &str,
        request: &HttpRequest,
        parse: F,
    ) -> Result<T, ProviderError>
    where
        F: Fn(HttpReply) -> Result<T, ProviderError>,
    {
        let max_attempts = self.policy.attempts();
        let mut hinted_delay: Option<Duration> = None;
        let mut last_error = ProviderError::AllProvidersExhausted;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = hinted_delay
                    .take()
                    .unwrap_or_else(|| self.policy.backoff(attempt));
                PROVIDER_RETRIES.with_label_values(&[provider]).inc();
                warn!(
                    provider,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "Retrying provider call"
                );
                tokio::time::sleep(delay).await;
            }

            debug!(provider, attempt, url = %redacted_url(&request.url), "Provider call");

            match self.transport.send(request).await {
                Ok(reply) if reply.is_success() => match parse(reply) {
                    Ok(value) => return Ok(value),
                    Err(e) if !e.is_retryable() => return Err(e),
                    Err(e) => {
                        last_error = e;
                    }
                },
                Ok(reply) if reply.is_rate_limited() => {
                    let retry_after = reply.retry_after();
                    if attempt + 1 >= max_attempts {
                        return Err(ProviderError::RateLimitExceeded { retry_after });
                    }
                    hinted_delay = retry_after;
                    last_error = ProviderError::RateLimitExceeded { retry_after };
                }
                Ok(reply) => {
                    last_error = reply.into_error();
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
