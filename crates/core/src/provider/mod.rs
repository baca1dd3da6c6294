//! Provider plumbing shared by the assistant and OCR pipelines.
//!
//! - [`HttpTransport`]: the single seam through which every provider call goes
//! - [`RetryExecutor`]: exponential backoff with `retry-after` handling
//! - [`ProviderDescriptor`] / [`Capability`]: provider identity by tag
//! - [`CandidateResult`] / [`ArbitrationDecision`]: scored outputs and the
//!   winner-selection rule

mod error;
mod retry;
mod transport;
mod types;

pub use error::ProviderError;
pub use retry::{RetryExecutor, RetryPolicy};
pub use transport::{HttpBody, HttpMethod, HttpReply, HttpRequest, HttpTransport, ReqwestTransport};
pub use types::{
    clamp_score, ArbitrationDecision, CandidateResult, Capability, ProviderDescriptor, Rejection,
};
