//! Mock OCR provider for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::ocr::{ImageInput, OcrProvider};
use crate::provider::{CandidateResult, Capability, ProviderDescriptor, ProviderError};

/// Mock implementation of [`OcrProvider`] with a fixed outcome and an
/// optional delay.
pub struct MockOcrProvider {
    descriptor: ProviderDescriptor,
    outcome: Result<(String, f32), ProviderError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockOcrProvider {
    /// Always reads `text` with confidence `score`.
    pub fn succeeding(name: &str, text: &str, score: f32) -> Self {
        Self::with_outcome(name, Ok((text.to_string(), score)))
    }

    /// Always fails with `error`.
    pub fn failing(name: &str, error: ProviderError) -> Self {
        Self::with_outcome(name, Err(error))
    }

    fn with_outcome(name: &str, outcome: Result<(String, f32), ProviderError>) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(name, Capability::Ocr),
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrProvider for MockOcrProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, _input: &ImageInput) -> Result<CandidateResult<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.outcome {
            Ok((text, score)) => Ok(CandidateResult::new(
                text.clone(),
                *score,
                self.descriptor.name.clone(),
            )),
            Err(e) => Err(e.clone()),
        }
    }
}
