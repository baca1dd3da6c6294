//! Deterministic local provider. Never fails, always scores low.

use async_trait::async_trait;

use super::types::{ImageInput, OcrProvider};
use crate::provider::{Capability, CandidateResult, ProviderDescriptor, ProviderError};

pub struct LocalFallbackProvider {
    descriptor: ProviderDescriptor,
    text: String,
    confidence: f32,
}

impl LocalFallbackProvider {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            descriptor: ProviderDescriptor::new("local_fallback", Capability::Ocr),
            text: text.into(),
            confidence,
        }
    }
}

#[async_trait]
impl OcrProvider for LocalFallbackProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, _input: &ImageInput) -> Result<CandidateResult<String>, ProviderError> {
        Ok(CandidateResult::new(
            self.text.clone(),
            self.confidence,
            self.descriptor.name.clone(),
        ))
    }
}
