//! Concurrent OCR race with post-hoc arbitration.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use super::types::{ImageInput, OcrExtraction, OcrProvider};
use crate::metrics::OCR_ARBITRATIONS;
use crate::provider::{ArbitrationDecision, ProviderError};

/// Runs every OCR provider on the same input and keeps the most confident
/// result.
///
/// All providers are awaited even after one succeeds, so arbitration always
/// compares the complete set of signals. Latency is that of the slowest
/// provider.
#[derive(Default)]
pub struct ConfidenceArbiter {
    providers: Vec<Arc<dyn OcrProvider>>,
}

impl ConfidenceArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. Launch order breaks confidence ties.
    pub fn with_provider(mut self, provider: Arc<dyn OcrProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|p| p.descriptor().name.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run all providers and select the winner.
    pub async fn arbitrate(&self, input: &ImageInput) -> ArbitrationDecision<String> {
        if let Err(e) = input.validate() {
            return ArbitrationDecision {
                outcome: Err(e),
                rejected: Vec::new(),
            };
        }

        let runs = self.providers.iter().map(|provider| async move {
            let name = provider.descriptor().name.clone();
            let outcome = provider.invoke(input).await;
            if let Err(e) = &outcome {
                warn!(provider = %name, error = %e, "OCR provider failed");
            }
            (name, outcome)
        });
        let outcomes = join_all(runs).await;

        let decision = ArbitrationDecision::select(outcomes);
        match &decision.outcome {
            Ok(winner) => {
                OCR_ARBITRATIONS
                    .with_label_values(&[winner.provider.as_str()])
                    .inc();
                info!(
                    winner = %winner.provider,
                    confidence = winner.score,
                    rejected = decision.rejected.len(),
                    "OCR arbitration complete"
                );
            }
            Err(e) => {
                OCR_ARBITRATIONS.with_label_values(&["none"]).inc();
                warn!(error = %e, "OCR arbitration produced no result");
            }
        }
        decision
    }

    /// Extract text, returning the winning result or a typed failure.
    pub async fn extract(&self, input: &ImageInput) -> Result<OcrExtraction, ProviderError> {
        let decision = self.arbitrate(input).await;
        let winner = decision.outcome?;
        Ok(OcrExtraction {
            text: winner.payload,
            confidence: winner.score,
            provider: winner.provider,
            rejected: decision.rejected,
        })
    }
}
