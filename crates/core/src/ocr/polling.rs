//! Submit-then-poll client for providers that answer with a job handle.
//!
//! State machine: `Submitted -> Polling -> {Succeeded | Failed | TimedOut}`.
//! Polls run on a fixed interval and are bounded by an attempt ceiling, so
//! a job can never hang its caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::POLLING_JOBS;
use crate::provider::{clamp_score, HttpReply, HttpRequest, ProviderError, RetryExecutor};

/// Poll cadence and ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingPolicy {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    30
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollingPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            max_attempts,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// One recognized line. `confidence` is in `[0, 1]` when reported.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedLine {
    pub text: String,
    pub confidence: Option<f32>,
}

impl RecognizedLine {
    pub fn new(text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Provider-reported job status.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Running,
    Succeeded(Vec<RecognizedLine>),
    Failed(String),
}

/// Result of a succeeded job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    /// Lines joined with `\n`.
    pub text: String,
    /// Mean line confidence scaled to `[0, 100]`; 0 when nothing reported one.
    pub confidence: f32,
    pub line_count: usize,
    /// Status polls issued.
    pub polls: u32,
}

impl JobResult {
    pub fn from_lines(lines: Vec<RecognizedLine>, polls: u32) -> Self {
        let scores: Vec<f32> = lines.iter().filter_map(|l| l.confidence).collect();
        let confidence = if scores.is_empty() {
            0.0
        } else {
            clamp_score(scores.iter().sum::<f32>() / scores.len() as f32 * 100.0)
        };
        Self {
            text: lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            confidence,
            line_count: lines.len(),
            polls,
        }
    }
}

/// Wire protocol of one job-based provider.
pub trait JobProtocol: Send + Sync {
    type Input: Sync;

    fn name(&self) -> &str;

    fn submit_request(&self, input: &Self::Input) -> Result<HttpRequest, ProviderError>;

    /// Job handle from the submission reply, if the provider returned one.
    fn job_handle(&self, reply: &HttpReply) -> Option<String>;

    fn status_request(&self, handle: &str) -> HttpRequest;

    fn parse_status(&self, reply: &HttpReply) -> Result<JobStatus, ProviderError>;
}

/// Polling state.
#[derive(Debug)]
enum PollState {
    Submitted(HttpReply),
    Polling { handle: String, attempt: u32 },
    Succeeded(JobResult),
    Failed(String),
    TimedOut { attempts: u32 },
}

/// Drives a [`JobProtocol`] from submission to a terminal state.
pub struct AsyncPollingClient<P> {
    protocol: P,
    executor: RetryExecutor,
    policy: PollingPolicy,
}

impl<P: JobProtocol> AsyncPollingClient<P> {
    /// The submission goes through `executor`; polls use its transport
    /// directly, one request per attempt.
    pub fn new(protocol: P, executor: RetryExecutor, policy: PollingPolicy) -> Self {
        Self {
            protocol,
            executor,
            policy,
        }
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn policy(&self) -> &PollingPolicy {
        &self.policy
    }

    /// Submit `input` and wait for the job to finish.
    ///
    /// Returns `JobFailed` when the provider reports failure or returns no
    /// handle, and `JobTimeout` when the job is still running after the
    /// last allowed poll.
    pub async fn submit_and_await(&self, input: &P::Input) -> Result<JobResult, ProviderError> {
        let name = self.protocol.name().to_string();
        let request = self.protocol.submit_request(input)?;
        let reply = self.executor.execute(&name, &request).await?;

        let mut state = PollState::Submitted(reply);
        loop {
            state = match state {
                PollState::Submitted(reply) => match self.protocol.job_handle(&reply) {
                    Some(handle) => {
                        debug!(provider = %name, %handle, "Job submitted");
                        PollState::Polling { handle, attempt: 0 }
                    }
                    None => PollState::Failed("submission returned no job handle".to_string()),
                },
                PollState::Polling { attempt, .. } if attempt >= self.policy.max_attempts => {
                    PollState::TimedOut { attempts: attempt }
                }
                PollState::Polling { handle, attempt } => {
                    tokio::time::sleep(self.policy.interval()).await;
                    let attempt = attempt + 1;
                    match self.poll_once(&handle).await {
                        Ok(JobStatus::Running) => {
                            debug!(provider = %name, attempt, "Job still running");
                            PollState::Polling { handle, attempt }
                        }
                        Ok(JobStatus::Succeeded(lines)) => {
                            PollState::Succeeded(JobResult::from_lines(lines, attempt))
                        }
                        Ok(JobStatus::Failed(reason)) => PollState::Failed(reason),
                        Err(e) if e.is_retryable() => {
                            warn!(provider = %name, attempt, error = %e, "Poll failed, will poll again");
                            PollState::Polling { handle, attempt }
                        }
                        Err(e) => PollState::Failed(e.to_string()),
                    }
                }
                PollState::Succeeded(result) => {
                    POLLING_JOBS.with_label_values(&["succeeded"]).inc();
                    info!(
                        provider = %name,
                        polls = result.polls,
                        confidence = result.confidence,
                        "Job succeeded"
                    );
                    return Ok(result);
                }
                PollState::Failed(reason) => {
                    POLLING_JOBS.with_label_values(&["failed"]).inc();
                    warn!(provider = %name, %reason, "Job failed");
                    return Err(ProviderError::JobFailed(reason));
                }
                PollState::TimedOut { attempts } => {
                    POLLING_JOBS.with_label_values(&["timed_out"]).inc();
                    warn!(provider = %name, attempts, "Job timed out");
                    return Err(ProviderError::JobTimeout { attempts });
                }
            };
        }
    }

    async fn poll_once(&self, handle: &str) -> Result<JobStatus, ProviderError> {
        let request = self.protocol.status_request(handle);
        let reply = self.executor.transport().send(&request).await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }
        self.protocol.parse_status(&reply)
    }
}
