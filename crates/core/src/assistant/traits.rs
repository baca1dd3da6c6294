//! Uniform call signature for chat providers.

use async_trait::async_trait;

use super::types::{ChatReply, ChatRequest};
use crate::provider::{ProviderDescriptor, ProviderError};

/// A provider that answers a chat request.
///
/// Identity and routing come from [`ProviderDescriptor::capability`], not
/// from the implementing type.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    async fn invoke(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError>;
}
