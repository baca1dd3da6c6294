//! Domain knowledge-base provider.
//!
//! The service keeps conversation state server-side keyed by an opaque
//! conversation id, so it gets a single attempt per request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::ChatProvider;
use super::types::{ChatReply, ChatRequest};
use crate::config::KnowledgeBaseConfig;
use crate::provider::{
    clamp_score, Capability, HttpRequest, ProviderDescriptor, ProviderError, RetryExecutor,
    RetryPolicy,
};

pub struct KnowledgeBaseProvider {
    descriptor: ProviderDescriptor,
    executor: RetryExecutor,
    api_base: String,
    api_key: Option<String>,
}

impl KnowledgeBaseProvider {
    /// `min_confidence` / `min_answer_chars` decide when an answer is
    /// authoritative.
    pub fn new(
        config: &KnowledgeBaseConfig,
        executor: RetryExecutor,
        min_confidence: f32,
        min_answer_chars: usize,
    ) -> Self {
        Self {
            descriptor: ProviderDescriptor::new("knowledge_base", Capability::KnowledgeBase)
                .with_thresholds(min_confidence, min_answer_chars),
            executor: executor.with_policy(RetryPolicy::single_attempt()),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
    locale: &'static str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    answer: String,
    confidence: f32,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    conversation_id: Option<String>,
}

#[async_trait]
impl ChatProvider for KnowledgeBaseProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError> {
        let body = QueryRequest {
            message: request.user_message(),
            conversation_id: request.conversation_id.as_deref(),
            locale: request.context.locale.code(),
        };
        let http = HttpRequest::post_json(
            format!("{}/query", self.api_base),
            serde_json::to_value(&body).unwrap_or_default(),
        )
        .with_bearer(self.api_key.as_deref());

        let parsed: QueryResponse = self
            .executor
            .execute_parsed(&self.descriptor.name, &http, |reply| {
                serde_json::from_str(&reply.body)
                    .map_err(|e| ProviderError::malformed("knowledge_base", e))
            })
            .await?;

        debug!(
            confidence = parsed.confidence,
            sources = parsed.sources.len(),
            "Knowledge base answered"
        );

        Ok(ChatReply {
            text: parsed.answer,
            confidence: Some(clamp_score(parsed.confidence)),
            sources: parsed.sources,
            // Carry the caller's id forward if the service did not echo one.
            conversation_id: parsed
                .conversation_id
                .or_else(|| request.conversation_id.clone()),
        })
    }
}
