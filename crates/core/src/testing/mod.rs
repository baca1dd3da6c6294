//! Testing utilities and mock implementations.
//!
//! Mocks stand in for every external service seam so the arbitration
//! layer can be exercised end to end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use apothecary_core::testing::{MockChatProvider, MockTransport};
//!
//! let kb = MockChatProvider::knowledge_base();
//! kb.push_answer("Take with food.", 85.0, &["Leaflet"]);
//!
//! let transport = MockTransport::new();
//! transport.push("/v1/chat/completions", HttpReply::new(429, ""));
//! ```

mod mock_chat_provider;
mod mock_ocr_provider;
mod mock_transport;

pub use mock_chat_provider::MockChatProvider;
pub use mock_ocr_provider::MockOcrProvider;
pub use mock_transport::{MockTransport, RecordedRequest};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::json;

    use crate::ocr::ImageInput;
    use crate::provider::HttpReply;
    use crate::substitution::MedicineRef;

    /// A small valid base64 PNG payload.
    pub fn png_input() -> ImageInput {
        ImageInput::base64("iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==", "image/png")
    }

    /// Document text detection response with one page per confidence.
    pub fn vision_reply(text: &str, page_confidences: &[f32]) -> String {
        let pages: Vec<_> = page_confidences
            .iter()
            .map(|c| json!({ "confidence": c }))
            .collect();
        json!({
            "responses": [{
                "fullTextAnnotation": { "text": text, "pages": pages }
            }]
        })
        .to_string()
    }

    /// Successful form-upload OCR response.
    pub fn ocr_space_reply(text: &str) -> String {
        json!({
            "ParsedResults": [{ "ParsedText": text }],
            "IsErroredOnProcessing": false
        })
        .to_string()
    }

    /// `202 Accepted` carrying the job location.
    pub fn read_job_accepted(location: &str) -> HttpReply {
        HttpReply::new(202, "").with_header("operation-location", location)
    }

    /// Completed read job with one line per `(text, confidence)`.
    pub fn read_job_succeeded(lines: &[(&str, f32)]) -> String {
        let lines: Vec<_> = lines
            .iter()
            .map(|(text, confidence)| json!({ "text": text, "confidence": confidence }))
            .collect();
        json!({
            "status": "succeeded",
            "analyzeResult": { "readResults": [{ "lines": lines }] }
        })
        .to_string()
    }

    /// Read job still in progress.
    pub fn read_job_running() -> String {
        json!({ "status": "running" }).to_string()
    }

    /// A medicine with the identifying fields used by the scorer.
    pub fn medicine(
        id: &str,
        generic_name: &str,
        therapeutic_class: &str,
        strength: &str,
        dosage_form: &str,
        manufacturer: &str,
    ) -> MedicineRef {
        MedicineRef {
            id: id.to_string(),
            generic_name: generic_name.to_string(),
            brand_name: format!("Brand {}", id),
            manufacturer: manufacturer.to_string(),
            strength: strength.to_string(),
            dosage_form: dosage_form.to_string(),
            therapeutic_class: therapeutic_class.to_string(),
        }
    }
}
