//! Provider router - knowledge base first for domain questions, general
//! completion otherwise, canned responses when both fail.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::classifier::ProviderClassifier;
use super::fallback::{canned_response, classify_topic};
use super::language::{detect_locale, Locale};
use super::prompt::{build_request_context, build_system_prompt};
use super::sanitizer::sanitize;
use super::traits::ChatProvider;
use super::types::{
    ChatRequest, ChatTurn, KnowledgeBaseOutcome, RequestContext, ResponseSource, RouteContext,
    RouteResponse,
};
use crate::metrics::ROUTE_RESPONSES;
use crate::provider::{Capability, ProviderError};

/// Routes one user message to the right provider family.
///
/// Providers are looked up by capability tag. Routing never fails: every
/// provider error is recovered either by the next provider or by the
/// canned-response table.
pub struct ProviderRouter {
    providers: HashMap<Capability, Arc<dyn ChatProvider>>,
    classifier: ProviderClassifier,
    max_retries: u32,
}

impl ProviderRouter {
    pub fn new(classifier: ProviderClassifier) -> Self {
        Self {
            providers: HashMap::new(),
            classifier,
            max_retries: 3,
        }
    }

    /// Register a provider under its descriptor's capability, replacing any
    /// previous one with the same tag.
    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        let capability = provider.descriptor().capability;
        self.providers.insert(capability, provider);
        self
    }

    /// Attempts allowed for the general completion call.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn provider(&self, capability: Capability) -> Option<&Arc<dyn ChatProvider>> {
        self.providers.get(&capability)
    }

    pub fn classifier(&self) -> &ProviderClassifier {
        &self.classifier
    }

    /// Answer `user_message`.
    ///
    /// `conversation_id` is the knowledge base's opaque conversation state;
    /// it is passed through unchanged unless the knowledge base returns a
    /// new one.
    pub async fn route(
        &self,
        user_message: &str,
        conversation_id: Option<String>,
        context: &RouteContext,
    ) -> RouteResponse {
        let locale = detect_locale(user_message);
        let mut conversation_id = conversation_id;

        let attempt = self
            .try_knowledge_base(user_message, &conversation_id, locale)
            .await;
        let kb_outcome = match attempt {
            KnowledgeBaseAttempt::Accepted {
                text,
                confidence,
                conversation_id,
            } => {
                info!(confidence, "Answered from knowledge base");
                return finish(RouteResponse {
                    text,
                    conversation_id,
                    used_knowledge_base: true,
                    locale,
                    source: ResponseSource::KnowledgeBase,
                    knowledge_base: KnowledgeBaseOutcome::Accepted { confidence },
                });
            }
            KnowledgeBaseAttempt::Declined {
                outcome,
                conversation_id: returned,
            } => {
                if returned.is_some() {
                    conversation_id = returned;
                }
                outcome
            }
        };

        let general = self.try_general(user_message, context, locale).await;
        let general_error = match general {
            Ok(text) => {
                return finish(RouteResponse {
                    text: sanitize(&text),
                    conversation_id,
                    used_knowledge_base: false,
                    locale,
                    source: ResponseSource::GeneralCompletion,
                    knowledge_base: kb_outcome,
                });
            }
            Err(e) => e,
        };

        let rate_limited = matches!(general_error, ProviderError::RateLimitExceeded { .. });
        let topic = classify_topic(user_message, rate_limited);
        warn!(
            error = %general_error,
            ?topic,
            "All assistant providers failed, using canned response"
        );

        finish(RouteResponse {
            text: canned_response(topic, locale, &context.metrics),
            conversation_id,
            used_knowledge_base: false,
            locale,
            source: ResponseSource::Canned,
            knowledge_base: kb_outcome,
        })
    }

    async fn try_knowledge_base(
        &self,
        user_message: &str,
        conversation_id: &Option<String>,
        locale: Locale,
    ) -> KnowledgeBaseAttempt {
        if !self.classifier.is_domain_specific(user_message) {
            return KnowledgeBaseAttempt::declined(KnowledgeBaseOutcome::SkippedNotDomain);
        }
        let Some(kb) = self.providers.get(&Capability::KnowledgeBase) else {
            debug!("Domain question but no knowledge base configured");
            return KnowledgeBaseAttempt::declined(KnowledgeBaseOutcome::NotConfigured);
        };

        let request = ChatRequest {
            context: RequestContext {
                turns: vec![ChatTurn::user(user_message)],
                model: String::new(),
                max_retries: 1,
                locale,
            },
            conversation_id: conversation_id.clone(),
        };

        match kb.invoke(&request).await {
            Ok(reply) => {
                let confidence = reply.confidence.unwrap_or(0.0);
                if kb.descriptor().is_authoritative(confidence, &reply.text) {
                    KnowledgeBaseAttempt::Accepted {
                        text: wrap_knowledge_base_answer(&reply.text, &reply.sources, locale),
                        confidence,
                        conversation_id: reply.conversation_id.or_else(|| conversation_id.clone()),
                    }
                } else {
                    let answer_chars = reply.text.chars().count();
                    info!(
                        confidence,
                        answer_chars, "Knowledge base answer below threshold, falling back"
                    );
                    KnowledgeBaseAttempt::Declined {
                        outcome: KnowledgeBaseOutcome::LowConfidence {
                            confidence,
                            answer_chars,
                        },
                        conversation_id: reply.conversation_id,
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Knowledge base unavailable, falling back");
                KnowledgeBaseAttempt::declined(KnowledgeBaseOutcome::Unavailable {
                    error_kind: e.kind().to_string(),
                })
            }
        }
    }

    async fn try_general(
        &self,
        user_message: &str,
        context: &RouteContext,
        locale: Locale,
    ) -> Result<String, ProviderError> {
        let provider = self
            .providers
            .get(&Capability::GeneralCompletion)
            .ok_or_else(|| ProviderError::NotConfigured("general completion".to_string()))?;

        let today = chrono::Local::now().date_naive();
        let system_prompt = build_system_prompt(locale, &context.metrics, today);
        let request = ChatRequest {
            context: build_request_context(
                locale,
                system_prompt,
                &context.history,
                user_message,
                "",
                self.max_retries,
            ),
            conversation_id: None,
        };

        let reply = provider.invoke(&request).await?;
        Ok(reply.text)
    }
}

enum KnowledgeBaseAttempt {
    Accepted {
        text: String,
        confidence: f32,
        conversation_id: Option<String>,
    },
    Declined {
        outcome: KnowledgeBaseOutcome,
        conversation_id: Option<String>,
    },
}

impl KnowledgeBaseAttempt {
    fn declined(outcome: KnowledgeBaseOutcome) -> Self {
        KnowledgeBaseAttempt::Declined {
            outcome,
            conversation_id: None,
        }
    }
}

fn finish(response: RouteResponse) -> RouteResponse {
    ROUTE_RESPONSES
        .with_label_values(&[response.source.as_str()])
        .inc();
    response
}

/// Append the localized source list and knowledge-base marker.
pub fn wrap_knowledge_base_answer(answer: &str, sources: &[String], locale: Locale) -> String {
    let (sources_heading, marker) = match locale {
        Locale::En => ("Sources:", "(From the pharmacy knowledge base)"),
        Locale::Ar => ("المصادر:", "(من قاعدة المعرفة الصيدلية)"),
    };

    let mut text = answer.trim().to_string();
    let sources: Vec<&str> = sources
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !sources.is_empty() {
        text.push_str("\n\n");
        text.push_str(sources_heading);
        for source in sources {
            text.push_str("\n- ");
            text.push_str(source);
        }
    }
    text.push_str("\n\n");
    text.push_str(marker);
    text
}
