//! Shared types for assistant routing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Locale;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Business metrics embedded verbatim into prompts. Never validated or
/// recomputed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_today: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_month: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_products: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_stock_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_prescriptions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Free-form extra figures, rendered as `key: value` lines.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl MetricsSnapshot {
    pub fn is_empty(&self) -> bool {
        self == &MetricsSnapshot::default()
    }
}

/// Caller-supplied context for one routed message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteContext {
    /// Earlier turns of this conversation, oldest first.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub metrics: MetricsSnapshot,
}

/// The outgoing call for one logical request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub turns: Vec<ChatTurn>,
    pub model: String,
    pub max_retries: u32,
    pub locale: Locale,
}

/// Request handed to a [`ChatProvider`](super::ChatProvider).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub context: RequestContext,
    /// Opaque server-side conversation state, carried unchanged.
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    /// The last user turn, which is what a knowledge base is asked.
    pub fn user_message(&self) -> &str {
        self.context
            .turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .unwrap_or("")
    }
}

/// Raw reply of a chat provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatReply {
    pub text: String,
    /// Provider-reported confidence in `[0, 100]`, when the provider has one.
    pub confidence: Option<f32>,
    pub sources: Vec<String>,
    pub conversation_id: Option<String>,
}

/// Which provider family produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    KnowledgeBase,
    GeneralCompletion,
    Canned,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::KnowledgeBase => "knowledge_base",
            ResponseSource::GeneralCompletion => "general_completion",
            ResponseSource::Canned => "canned",
        }
    }
}

/// What happened on the knowledge-base path.
///
/// Keeps "unreachable" and "answered but not trusted" apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KnowledgeBaseOutcome {
    /// The message did not look domain-specific.
    SkippedNotDomain,
    /// No knowledge-base provider is configured.
    NotConfigured,
    /// The provider call failed.
    Unavailable { error_kind: String },
    /// The provider answered below the confidence or length threshold.
    LowConfidence { confidence: f32, answer_chars: usize },
    /// The provider's answer was used.
    Accepted { confidence: f32 },
}

/// Result of routing one user message. Always produced, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub used_knowledge_base: bool,
    pub locale: Locale,
    pub source: ResponseSource,
    pub knowledge_base: KnowledgeBaseOutcome,
}
