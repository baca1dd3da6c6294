use std::sync::Arc;

use apothecary_core::{
    create_ocr_arbiter, create_provider_router, ConfidenceArbiter, Config, HttpTransport,
    ProviderError, ProviderRouter, SanitizedConfig, SimilarityScorer,
};

/// Shared application state
pub struct AppState {
    config: Config,
    router: ProviderRouter,
    arbiter: ConfidenceArbiter,
    scorer: SimilarityScorer,
}

impl AppState {
    pub fn new(
        config: Config,
        router: ProviderRouter,
        arbiter: ConfidenceArbiter,
        scorer: SimilarityScorer,
    ) -> Self {
        Self {
            config,
            router,
            arbiter,
            scorer,
        }
    }

    /// Build every component from configuration.
    ///
    /// `transport` replaces the HTTP client for all providers (tests).
    pub fn from_config(
        config: Config,
        transport: Option<Arc<dyn HttpTransport>>,
    ) -> Result<Self, ProviderError> {
        let router = create_provider_router(&config, transport.clone())?;
        let arbiter = create_ocr_arbiter(&config, transport)?;
        let scorer = SimilarityScorer::new(config.substitution.max_results);
        Ok(Self::new(config, router, arbiter, scorer))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn router(&self) -> &ProviderRouter {
        &self.router
    }

    pub fn arbiter(&self) -> &ConfidenceArbiter {
        &self.arbiter
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }
}
