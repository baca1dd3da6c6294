//! Conversational assistant.
//!
//! Routes each user message to a domain knowledge base or a general
//! completion model, then falls back to canned responses.
//!
//! - [`ProviderRouter`]: the routing pipeline
//! - [`ProviderClassifier`]: keyword gate for the knowledge base
//! - [`detect_locale`]: script-based locale detection
//! - [`sanitize`]: strips reasoning artifacts from completions

mod classifier;
mod completion;
mod fallback;
mod knowledge_base;
mod language;
mod prompt;
mod router;
mod sanitizer;
mod traits;
mod types;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

pub use classifier::{ProviderClassifier, DEFAULT_KEYWORDS};
pub use completion::CompletionProvider;
pub use fallback::{canned_response, classify_topic, CannedTopic};
pub use knowledge_base::KnowledgeBaseProvider;
pub use language::{detect_locale, Locale};
pub use prompt::{build_request_context, build_system_prompt};
pub use router::{wrap_knowledge_base_answer, ProviderRouter};
pub use sanitizer::sanitize;
pub use traits::ChatProvider;
pub use types::{
    ChatReply, ChatRequest, ChatTurn, KnowledgeBaseOutcome, MetricsSnapshot, RequestContext,
    ResponseSource, Role, RouteContext, RouteResponse,
};

use crate::config::Config;
use crate::provider::{HttpTransport, ProviderError, ReqwestTransport, RetryExecutor};

/// Build a [`ProviderRouter`] from configuration.
///
/// `transport` overrides the HTTP client (tests); when `None`, each
/// provider gets a reqwest client with its configured timeout. Providers
/// without credentials are left out.
pub fn create_provider_router(
    config: &Config,
    transport: Option<Arc<dyn HttpTransport>>,
) -> Result<ProviderRouter, ProviderError> {
    let assistant = &config.assistant;
    let classifier = match &assistant.keywords {
        Some(keywords) => ProviderClassifier::new(keywords.iter().cloned()),
        None => ProviderClassifier::default(),
    };
    let mut router = ProviderRouter::new(classifier).with_max_retries(config.retry.max_attempts);

    let transport_for = |timeout_secs: u32| -> Result<Arc<dyn HttpTransport>, ProviderError> {
        match &transport {
            Some(t) => Ok(t.clone()),
            None => Ok(Arc::new(ReqwestTransport::new(Duration::from_secs(
                timeout_secs as u64,
            ))?)),
        }
    };

    if let Some(kb) = &assistant.knowledge_base {
        let executor = RetryExecutor::new(transport_for(kb.timeout_secs)?, config.retry.clone());
        router = router.with_provider(Arc::new(KnowledgeBaseProvider::new(
            kb,
            executor,
            assistant.kb_min_confidence,
            assistant.kb_min_answer_chars,
        )));
        info!(api_base = %kb.api_base, "Knowledge base provider enabled");
    } else {
        info!("Knowledge base provider not configured");
    }

    match &assistant.completion {
        Some(completion)
            if !completion.api.requires_api_key()
                || completion.api_key.as_deref().is_some_and(|k| !k.is_empty()) =>
        {
            let executor =
                RetryExecutor::new(transport_for(completion.timeout_secs)?, config.retry.clone());
            router = router.with_provider(Arc::new(CompletionProvider::new(completion, executor)));
            info!(
                api = completion.api.as_str(),
                model = %completion.model,
                "General completion provider enabled"
            );
        }
        Some(completion) => {
            info!(
                api = completion.api.as_str(),
                "General completion provider has no API key, disabled"
            );
        }
        None => info!("General completion provider not configured"),
    }

    Ok(router)
}
