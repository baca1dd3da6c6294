//! Document text detection provider (synchronous `images:annotate` API).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::types::{non_empty_text, ImageInput, OcrProvider};
use crate::config::VisionConfig;
use crate::provider::{
    Capability, CandidateResult, HttpReply, HttpRequest, ProviderDescriptor, ProviderError,
    RetryExecutor,
};

const DEFAULT_API_BASE: &str = "https://vision.googleapis.com";

pub struct VisionOcrProvider {
    descriptor: ProviderDescriptor,
    executor: RetryExecutor,
    api_key: String,
    api_base: String,
}

impl VisionOcrProvider {
    pub fn new(config: &VisionConfig, executor: RetryExecutor) -> Self {
        Self {
            descriptor: ProviderDescriptor::new("vision", Capability::Ocr),
            executor,
            api_key: config.api_key.clone(),
            api_base: config
                .api_base
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResult {
    #[serde(default)]
    full_text_annotation: Option<FullTextAnnotation>,
    #[serde(default)]
    error: Option<AnnotateError>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct AnnotateError {
    #[serde(default)]
    message: String,
}

fn parse_annotate(reply: HttpReply) -> Result<AnnotateResult, ProviderError> {
    let parsed: AnnotateResponse = serde_json::from_str(&reply.body)
        .map_err(|e| ProviderError::malformed("vision", e))?;
    parsed
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::malformed("vision", "no responses"))
}

#[async_trait]
impl OcrProvider for VisionOcrProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, input: &ImageInput) -> Result<CandidateResult<String>, ProviderError> {
        let image = match input {
            ImageInput::Base64 { .. } => json!({ "content": input.payload().unwrap_or_default() }),
            ImageInput::Url(url) => json!({ "source": { "imageUri": url } }),
        };
        let body = json!({
            "requests": [{
                "image": image,
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }]
            }]
        });
        let request =
            HttpRequest::post_json(format!("{}/v1/images:annotate", self.api_base), body)
                .with_header("x-goog-api-key", self.api_key.clone());

        let result = self
            .executor
            .execute_parsed(&self.descriptor.name, &request, parse_annotate)
            .await?;

        if let Some(error) = result.error {
            return Err(ProviderError::Transient(format!(
                "vision annotate error: {}",
                error.message
            )));
        }
        let annotation = result.full_text_annotation.ok_or_else(|| {
            ProviderError::Transient("vision returned no text".to_string())
        })?;

        let confidences: Vec<f32> = annotation.pages.iter().filter_map(|p| p.confidence).collect();
        let confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f32>() / confidences.len() as f32 * 100.0
        };

        let text = non_empty_text("vision", annotation.text)?;
        Ok(CandidateResult::new(text, confidence, self.descriptor.name.clone()))
    }
}
