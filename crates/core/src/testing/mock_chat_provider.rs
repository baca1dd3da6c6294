//! Mock chat provider for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::assistant::{ChatProvider, ChatReply, ChatRequest};
use crate::provider::{Capability, ProviderDescriptor, ProviderError};

/// Mock implementation of [`ChatProvider`].
///
/// Answers with scripted replies in order; once drained, every call fails
/// with a transient error. Every request is recorded.
pub struct MockChatProvider {
    descriptor: ProviderDescriptor,
    replies: Mutex<VecDeque<Result<ChatReply, ProviderError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatProvider {
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self {
            descriptor,
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Knowledge-base provider with the default 60 / 20 thresholds.
    pub fn knowledge_base() -> Self {
        Self::new(
            ProviderDescriptor::new("mock-kb", Capability::KnowledgeBase).with_thresholds(60.0, 20),
        )
    }

    /// General completion provider.
    pub fn completion() -> Self {
        Self::new(ProviderDescriptor::new(
            "mock-completion",
            Capability::GeneralCompletion,
        ))
    }

    /// Queue a plain text reply.
    pub fn push_text(&self, text: &str) {
        self.push_reply(ChatReply {
            text: text.to_string(),
            ..Default::default()
        });
    }

    /// Queue a knowledge-base style reply with confidence and sources.
    pub fn push_answer(&self, text: &str, confidence: f32, sources: &[&str]) {
        self.push_reply(ChatReply {
            text: text.to_string(),
            confidence: Some(confidence),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            conversation_id: None,
        });
    }

    pub fn push_reply(&self, reply: ChatReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn push_error(&self, error: ProviderError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// All recorded requests.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transient("no scripted reply".to_string())))
    }
}
