//! Asynchronous read-job OCR provider.
//!
//! Submission returns `202 Accepted` with an `operation-location` header;
//! the result is fetched by polling that location.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::polling::{AsyncPollingClient, JobProtocol, JobStatus, PollingPolicy, RecognizedLine};
use super::types::{non_empty_text, ImageInput, OcrProvider};
use crate::config::ReadJobConfig;
use crate::provider::{
    Capability, CandidateResult, HttpReply, HttpRequest, ProviderDescriptor, ProviderError,
    RetryExecutor,
};

const KEY_HEADER: &str = "ocp-apim-subscription-key";

/// Wire protocol of the read-job API.
pub struct ReadJobProtocol {
    endpoint: String,
    api_key: String,
}

impl ReadJobProtocol {
    pub fn new(config: &ReadJobConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadStatus {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ReadError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResult {
    #[serde(default)]
    read_results: Vec<ReadPage>,
}

#[derive(Debug, Deserialize)]
struct ReadPage {
    #[serde(default)]
    lines: Vec<ReadLine>,
}

#[derive(Debug, Deserialize)]
struct ReadLine {
    text: String,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    words: Vec<ReadWord>,
}

#[derive(Debug, Deserialize)]
struct ReadWord {
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ReadError {
    #[serde(default)]
    message: String,
}

impl ReadLine {
    /// The line's own confidence, else the mean of its word confidences.
    fn confidence(&self) -> Option<f32> {
        if self.confidence.is_some() {
            return self.confidence;
        }
        let words: Vec<f32> = self.words.iter().filter_map(|w| w.confidence).collect();
        if words.is_empty() {
            None
        } else {
            Some(words.iter().sum::<f32>() / words.len() as f32)
        }
    }
}

impl JobProtocol for ReadJobProtocol {
    type Input = ImageInput;

    fn name(&self) -> &str {
        "read_job"
    }

    fn submit_request(&self, input: &ImageInput) -> Result<HttpRequest, ProviderError> {
        let url = format!("{}/vision/v3.2/read/analyze", self.endpoint);
        let request = match input {
            ImageInput::Base64 { .. } => {
                HttpRequest::post_bytes(url, input.decode()?, "application/octet-stream")
            }
            ImageInput::Url(image_url) => HttpRequest::post_json(url, json!({ "url": image_url })),
        };
        Ok(request.with_header(KEY_HEADER, self.api_key.clone()))
    }

    /// Only handles under the configured endpoint are polled; the
    /// subscription key is never sent to another host.
    fn job_handle(&self, reply: &HttpReply) -> Option<String> {
        let handle = reply
            .header("operation-location")
            .map(str::trim)
            .filter(|h| !h.is_empty())?;
        if !handle.starts_with(&format!("{}/", self.endpoint)) {
            warn!(endpoint = %self.endpoint, "Ignoring job handle outside the configured endpoint");
            return None;
        }
        Some(handle.to_string())
    }

    fn status_request(&self, handle: &str) -> HttpRequest {
        HttpRequest::get(handle).with_header(KEY_HEADER, self.api_key.clone())
    }

    fn parse_status(&self, reply: &HttpReply) -> Result<JobStatus, ProviderError> {
        let parsed: ReadStatus = serde_json::from_str(&reply.body)
            .map_err(|e| ProviderError::malformed("read_job", e))?;

        match parsed.status.to_ascii_lowercase().as_str() {
            "succeeded" => {
                let lines = parsed
                    .analyze_result
                    .map(|r| r.read_results)
                    .unwrap_or_default()
                    .into_iter()
                    .flat_map(|page| page.lines)
                    .map(|line| {
                        let confidence = line.confidence();
                        RecognizedLine::new(line.text, confidence)
                    })
                    .collect();
                Ok(JobStatus::Succeeded(lines))
            }
            "failed" => Ok(JobStatus::Failed(
                parsed
                    .error
                    .map(|e| e.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "read job failed".to_string()),
            )),
            _ => Ok(JobStatus::Running),
        }
    }
}

/// OCR provider backed by the read-job API.
pub struct ReadJobOcrProvider {
    descriptor: ProviderDescriptor,
    client: AsyncPollingClient<ReadJobProtocol>,
}

impl ReadJobOcrProvider {
    pub fn new(config: &ReadJobConfig, executor: RetryExecutor, polling: PollingPolicy) -> Self {
        Self {
            descriptor: ProviderDescriptor::new("read_job", Capability::Ocr),
            client: AsyncPollingClient::new(ReadJobProtocol::new(config), executor, polling),
        }
    }
}

#[async_trait]
impl OcrProvider for ReadJobOcrProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, input: &ImageInput) -> Result<CandidateResult<String>, ProviderError> {
        let result = self.client.submit_and_await(input).await?;
        let text = non_empty_text("read_job", result.text)?;
        Ok(CandidateResult::new(
            text,
            result.confidence,
            self.descriptor.name.clone(),
        ))
    }
}
