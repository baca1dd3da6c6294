//! OCR extraction endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use apothecary_core::{ImageInput, OcrExtraction, ProviderError};

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// Exactly one of `image_base64` and `image_url` must be set.
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ExtractRequest {
    fn into_input(self) -> Result<ImageInput, String> {
        match (self.image_base64, self.image_url) {
            (Some(data), None) => Ok(ImageInput::base64(
                data,
                self.mime_type.unwrap_or_else(|| "image/png".to_string()),
            )),
            (None, Some(url)) => Ok(ImageInput::url(url)),
            (Some(_), Some(_)) => Err("provide either image_base64 or image_url, not both".into()),
            (None, None) => Err("image_base64 or image_url is required".into()),
        }
    }
}

/// POST /api/v1/ocr/extract
pub async fn extract(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExtractRequest>,
) -> Result<Json<OcrExtraction>, (StatusCode, Json<ErrorResponse>)> {
    let input = body
        .into_input()
        .map_err(|e| (StatusCode::BAD_REQUEST, ErrorResponse::new(e)))?;

    if state.arbiter().is_empty() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorResponse::new("OCR is disabled: no provider configured"),
        ));
    }

    match state.arbiter().extract(&input).await {
        Ok(extraction) => Ok(Json(extraction)),
        Err(e @ ProviderError::InvalidInput(_)) => {
            Err((StatusCode::BAD_REQUEST, ErrorResponse::new(e.to_string())))
        }
        Err(e) => {
            warn!(error = %e, "OCR extraction failed");
            Err((StatusCode::BAD_GATEWAY, ErrorResponse::new(e.to_string())))
        }
    }
}
