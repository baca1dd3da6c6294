//! OCR pipeline.
//!
//! Several providers read the same image concurrently and the most
//! confident result wins:
//!
//! - [`VisionOcrProvider`]: synchronous document text detection
//! - [`OcrSpaceProvider`]: synchronous form upload, assumed confidence
//! - [`ReadJobOcrProvider`]: asynchronous job, driven by [`AsyncPollingClient`]
//! - [`LocalFallbackProvider`]: deterministic, never fails
//!
//! [`ConfidenceArbiter`] runs them and selects the winner.

mod arbiter;
mod local;
mod ocr_space;
mod polling;
mod read_job;
mod types;
mod vision;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

pub use arbiter::ConfidenceArbiter;
pub use local::LocalFallbackProvider;
pub use ocr_space::OcrSpaceProvider;
pub use polling::{
    AsyncPollingClient, JobProtocol, JobResult, JobStatus, PollingPolicy, RecognizedLine,
};
pub use read_job::{ReadJobOcrProvider, ReadJobProtocol};
pub use types::{ImageInput, OcrExtraction, OcrProvider};
pub use vision::VisionOcrProvider;

use crate::config::Config;
use crate::provider::{HttpTransport, ProviderError, ReqwestTransport, RetryExecutor};

/// Build the OCR arbiter from configuration.
///
/// Providers without credentials are skipped. `transport` overrides the
/// HTTP client (tests).
pub fn create_ocr_arbiter(
    config: &Config,
    transport: Option<Arc<dyn HttpTransport>>,
) -> Result<ConfidenceArbiter, ProviderError> {
    let ocr = &config.ocr;
    let transport: Arc<dyn HttpTransport> = match transport {
        Some(t) => t,
        None => Arc::new(ReqwestTransport::new(Duration::from_secs(
            ocr.timeout_secs as u64,
        ))?),
    };
    let executor = RetryExecutor::new(transport, config.retry.clone());
    let mut arbiter = ConfidenceArbiter::new();

    match &ocr.vision {
        Some(vision) if !vision.api_key.is_empty() => {
            arbiter = arbiter.with_provider(Arc::new(VisionOcrProvider::new(vision, executor.clone())));
            info!("Vision OCR provider enabled");
        }
        _ => info!("Vision OCR provider not configured"),
    }

    match &ocr.ocr_space {
        Some(ocr_space) if !ocr_space.api_key.is_empty() => {
            arbiter = arbiter.with_provider(Arc::new(OcrSpaceProvider::new(
                ocr_space,
                executor.clone(),
            )));
            info!(language = %ocr_space.language, "OCR.space provider enabled");
        }
        _ => info!("OCR.space provider not configured"),
    }

    match &ocr.read_job {
        Some(read_job) if !read_job.api_key.is_empty() && !read_job.endpoint.is_empty() => {
            arbiter = arbiter.with_provider(Arc::new(ReadJobOcrProvider::new(
                read_job,
                executor.clone(),
                config.polling.clone(),
            )));
            info!(endpoint = %read_job.endpoint, "Read-job OCR provider enabled");
        }
        _ => info!("Read-job OCR provider not configured"),
    }

    if ocr.local_fallback {
        arbiter = arbiter.with_provider(Arc::new(LocalFallbackProvider::new(
            ocr.fallback_text.clone(),
            ocr.fallback_confidence,
        )));
    }

    Ok(arbiter)
}
