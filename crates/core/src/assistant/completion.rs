//! General-purpose completion provider.
//!
//! Speaks three wire shapes: OpenAI-compatible chat completions, the
//! Anthropic messages API and the local Ollama chat API. Every reply is
//! checked against the expected shape before use.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::ChatProvider;
use super::types::{ChatReply, ChatRequest, ChatTurn, Role};
use crate::config::{CompletionApi, CompletionConfig};
use crate::provider::{
    Capability, HttpReply, HttpRequest, ProviderDescriptor, ProviderError, RetryExecutor,
    RetryPolicy,
};

/// Completion client bound to one API, model and credential.
pub struct CompletionProvider {
    descriptor: ProviderDescriptor,
    executor: RetryExecutor,
    api: CompletionApi,
    model: String,
    api_key: Option<String>,
    api_base: String,
    max_tokens: u32,
    temperature: f32,
}

impl CompletionProvider {
    pub fn new(config: &CompletionConfig, executor: RetryExecutor) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(config.api.as_str(), Capability::GeneralCompletion),
            executor,
            api: config.api,
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| config.api.default_api_base().to_string())
                .trim_end_matches('/')
                .to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api(&self) -> CompletionApi {
        self.api
    }

    fn build_request(&self, request: &ChatRequest) -> HttpRequest {
        let model = if request.context.model.is_empty() {
            self.model.clone()
        } else {
            request.context.model.clone()
        };
        let turns = &request.context.turns;

        match self.api {
            CompletionApi::OpenAi => {
                let body = OpenAiRequest {
                    model,
                    messages: turns.iter().map(WireMessage::from).collect(),
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                };
                HttpRequest::post_json(
                    format!("{}/v1/chat/completions", self.api_base),
                    serde_json::to_value(&body).unwrap_or_default(),
                )
                .with_bearer(self.api_key.as_deref())
            }
            CompletionApi::Anthropic => {
                // System turns move to the top-level `system` field.
                let system: Vec<&str> = turns
                    .iter()
                    .filter(|t| t.role == Role::System)
                    .map(|t| t.content.as_str())
                    .collect();
                let body = AnthropicRequest {
                    model,
                    max_tokens: self.max_tokens,
                    system: if system.is_empty() {
                        None
                    } else {
                        Some(system.join("\n\n"))
                    },
                    messages: turns
                        .iter()
                        .filter(|t| t.role != Role::System)
                        .map(WireMessage::from)
                        .collect(),
                    temperature: self.temperature,
                };
                let mut http = HttpRequest::post_json(
                    format!("{}/v1/messages", self.api_base),
                    serde_json::to_value(&body).unwrap_or_default(),
                )
                .with_header("anthropic-version", "2023-06-01");
                if let Some(key) = &self.api_key {
                    http = http.with_header("x-api-key", key.clone());
                }
                http
            }
            CompletionApi::Ollama => {
                let body = OllamaRequest {
                    model,
                    messages: turns.iter().map(WireMessage::from).collect(),
                    stream: false,
                    options: OllamaOptions {
                        temperature: self.temperature,
                        num_predict: self.max_tokens,
                    },
                };
                HttpRequest::post_json(
                    format!("{}/api/chat", self.api_base),
                    serde_json::to_value(&body).unwrap_or_default(),
                )
            }
        }
    }

    fn parse_reply(&self, reply: &HttpReply) -> Result<String, ProviderError> {
        let name = self.api.as_str();
        let text = match self.api {
            CompletionApi::OpenAi => {
                let parsed: OpenAiResponse = serde_json::from_str(&reply.body)
                    .map_err(|e| ProviderError::malformed(name, e))?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| ProviderError::malformed(name, "no choices"))?
            }
            CompletionApi::Anthropic => {
                let parsed: AnthropicResponse = serde_json::from_str(&reply.body)
                    .map_err(|e| ProviderError::malformed(name, e))?;
                parsed
                    .content
                    .into_iter()
                    .filter(|c| c.content_type == "text")
                    .filter_map(|c| c.text)
                    .collect::<Vec<_>>()
                    .join("")
            }
            CompletionApi::Ollama => {
                let parsed: OllamaResponse = serde_json::from_str(&reply.body)
                    .map_err(|e| ProviderError::malformed(name, e))?;
                parsed.message.content
            }
        };

        if text.trim().is_empty() {
            return Err(ProviderError::malformed(name, "empty completion"));
        }
        Ok(text)
    }
}

#[async_trait]
impl ChatProvider for CompletionProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError> {
        if self.api.requires_api_key() && self.api_key.is_none() {
            return Err(ProviderError::NotConfigured(format!(
                "{} completion has no API key",
                self.api.as_str()
            )));
        }

        let policy = RetryPolicy {
            max_attempts: request.context.max_retries,
            base_delay_ms: self.executor.policy().base_delay_ms,
        };
        let http = self.build_request(request);
        let text = self
            .executor
            .with_policy(policy)
            .execute_parsed(self.descriptor.name.as_str(), &http, |reply| {
                self.parse_reply(&reply)
            })
            .await?;
        debug!(
            provider = self.api.as_str(),
            chars = text.chars().count(),
            "Completion received"
        );

        Ok(ChatReply {
            text,
            confidence: None,
            sources: Vec::new(),
            conversation_id: None,
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatTurn> for WireMessage {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role.as_str(),
            content: turn.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}
