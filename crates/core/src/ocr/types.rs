//! OCR input, output and provider trait.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::provider::{CandidateResult, ProviderDescriptor, ProviderError, Rejection};

/// Image handed to the OCR pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageInput {
    /// Inline image bytes, base64-encoded. A `data:` URI prefix is accepted.
    Base64 { data: String, mime_type: String },
    /// Publicly reachable http(s) URL.
    Url(String),
}

impl ImageInput {
    pub fn base64(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ImageInput::Base64 {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        ImageInput::Url(url.into())
    }

    /// Reject malformed input before any provider is contacted.
    pub fn validate(&self) -> Result<(), ProviderError> {
        match self {
            ImageInput::Base64 { mime_type, .. } => {
                if !(mime_type.starts_with("image/") || mime_type == "application/pdf") {
                    return Err(ProviderError::InvalidInput(format!(
                        "unsupported mime type '{}'",
                        mime_type
                    )));
                }
                self.decode().map(|_| ())
            }
            ImageInput::Url(url) => {
                let url = url.trim();
                let rest = url
                    .strip_prefix("https://")
                    .or_else(|| url.strip_prefix("http://"));
                match rest {
                    Some(host) if !host.is_empty() => Ok(()),
                    _ => Err(ProviderError::InvalidInput(format!(
                        "image URL must be http(s): '{}'",
                        url
                    ))),
                }
            }
        }
    }

    /// The bare base64 payload, without any `data:` URI prefix.
    pub fn payload(&self) -> Option<&str> {
        match self {
            ImageInput::Base64 { data, .. } => {
                let data = data.trim();
                Some(match data.split_once(";base64,") {
                    Some((prefix, rest)) if prefix.starts_with("data:") => rest,
                    _ => data,
                })
            }
            ImageInput::Url(_) => None,
        }
    }

    /// Decoded image bytes for inline input.
    pub fn decode(&self) -> Result<Vec<u8>, ProviderError> {
        let payload = self
            .payload()
            .ok_or_else(|| ProviderError::InvalidInput("image is a URL, not inline data".into()))?;
        if payload.is_empty() {
            return Err(ProviderError::InvalidInput("image data is empty".into()));
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| ProviderError::InvalidInput(format!("image data is not base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(ProviderError::InvalidInput("image data is empty".into()));
        }
        Ok(bytes)
    }

    /// `data:` URI for inline input.
    pub fn data_uri(&self) -> Option<String> {
        match self {
            ImageInput::Base64 { mime_type, .. } => self
                .payload()
                .map(|p| format!("data:{};base64,{}", mime_type, p)),
            ImageInput::Url(_) => None,
        }
    }
}

/// Winning OCR result returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrExtraction {
    pub text: String,
    /// Confidence in `[0, 100]`.
    pub confidence: f32,
    pub provider: String,
    /// Failed and out-scored providers.
    pub rejected: Vec<Rejection>,
}

/// An OCR provider. Results are scored candidates; the payload is the
/// extracted text.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    async fn invoke(&self, input: &ImageInput) -> Result<CandidateResult<String>, ProviderError>;
}

/// Empty text from a remote provider counts as a failure.
pub(crate) fn non_empty_text(provider: &str, text: String) -> Result<String, ProviderError> {
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ProviderError::Transient(format!(
            "{} returned no text",
            provider
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    // "hello" in base64
    const HELLO: &str = "aGVsbG8=";

    #[test]
    fn test_valid_inputs() {
        assert!(ImageInput::base64(HELLO, "image/png").validate().is_ok());
        assert!(ImageInput::base64(format!("data:image/png;base64,{}", HELLO), "image/png")
            .validate()
            .is_ok());
        assert!(ImageInput::url("https://cdn.example.com/rx.jpg").validate().is_ok());
    }

    #[test]
    fn test_invalid_inputs() {
        let cases = [
            ImageInput::base64("", "image/png"),
            ImageInput::base64("   ", "image/jpeg"),
            ImageInput::base64("not base64!!", "image/png"),
            ImageInput::base64(HELLO, "text/plain"),
            ImageInput::url("ftp://example.com/a.png"),
            ImageInput::url("https://"),
            ImageInput::url("rx.jpg"),
        ];
        for input in cases {
            assert!(
                matches!(input.validate(), Err(ProviderError::InvalidInput(_))),
                "{:?} should be invalid",
                input
            );
        }
    }

    #[test]
    fn test_decode_strips_data_uri() {
        let input = ImageInput::base64(format!("data:image/png;base64,{}", HELLO), "image/png");
        assert_eq!(input.decode().unwrap(), b"hello");
        assert_eq!(
            input.data_uri().unwrap(),
            format!("data:image/png;base64,{}", HELLO)
        );
    }

    #[test]
    fn test_non_empty_text() {
        assert_eq!(non_empty_text("p", " a ".into()).unwrap(), "a");
        assert!(non_empty_text("p", "\n ".into()).is_err());
    }
}
