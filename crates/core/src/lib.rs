pub mod assistant;
pub mod config;
pub mod metrics;
pub mod ocr;
pub mod provider;
pub mod substitution;
pub mod testing;

pub use assistant::{
    create_provider_router, detect_locale, sanitize, ChatProvider, Locale, MetricsSnapshot,
    ProviderClassifier, ProviderRouter, ResponseSource, RouteContext, RouteResponse,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use ocr::{
    create_ocr_arbiter, AsyncPollingClient, ConfidenceArbiter, ImageInput, OcrExtraction,
    OcrProvider, PollingPolicy,
};
pub use provider::{
    ArbitrationDecision, CandidateResult, Capability, HttpTransport, ProviderDescriptor,
    ProviderError, RetryExecutor, RetryPolicy,
};
pub use substitution::{Availability, MedicineRef, SimilarityScorer, SubstitutionReport};
