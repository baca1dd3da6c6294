//! Form-upload OCR provider. Reports no confidence of its own, so results
//! carry a configured assumed confidence.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::types::{non_empty_text, ImageInput, OcrProvider};
use crate::config::OcrSpaceConfig;
use crate::provider::{
    Capability, CandidateResult, HttpRequest, ProviderDescriptor, ProviderError, RetryExecutor,
};

const DEFAULT_API_BASE: &str = "https://api.ocr.space";

pub struct OcrSpaceProvider {
    descriptor: ProviderDescriptor,
    executor: RetryExecutor,
    api_key: String,
    api_base: String,
    language: String,
    assumed_confidence: f32,
}

impl OcrSpaceProvider {
    pub fn new(config: &OcrSpaceConfig, executor: RetryExecutor) -> Self {
        Self {
            descriptor: ProviderDescriptor::new("ocr_space", Capability::Ocr),
            executor,
            api_key: config.api_key.clone(),
            api_base: config
                .api_base
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            language: config.language.clone(),
            assumed_confidence: config.assumed_confidence,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParseResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    /// A string or a list of strings.
    #[serde(default)]
    error_message: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

fn error_message(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        _ => "processing failed".to_string(),
    }
}

#[async_trait]
impl OcrProvider for OcrSpaceProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, input: &ImageInput) -> Result<CandidateResult<String>, ProviderError> {
        let mut fields = vec![
            ("apikey".to_string(), self.api_key.clone()),
            ("language".to_string(), self.language.clone()),
            ("isOverlayRequired".to_string(), "false".to_string()),
            ("OCREngine".to_string(), "2".to_string()),
        ];
        match input {
            ImageInput::Base64 { .. } => {
                fields.push(("base64Image".to_string(), input.data_uri().unwrap_or_default()))
            }
            ImageInput::Url(url) => fields.push(("url".to_string(), url.clone())),
        }
        let request = HttpRequest::post_form(format!("{}/parse/image", self.api_base), fields);

        let parsed: ParseResponse = self
            .executor
            .execute_parsed(&self.descriptor.name, &request, |reply| {
                serde_json::from_str(&reply.body)
                    .map_err(|e| ProviderError::malformed("ocr_space", e))
            })
            .await?;

        if parsed.is_errored_on_processing {
            return Err(ProviderError::Transient(format!(
                "ocr_space processing error: {}",
                error_message(parsed.error_message)
            )));
        }

        let text = parsed
            .parsed_results
            .into_iter()
            .map(|r| r.parsed_text.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let text = non_empty_text("ocr_space", text)?;

        Ok(CandidateResult::new(
            text,
            self.assumed_confidence,
            self.descriptor.name.clone(),
        ))
    }
}
