//! Assistant chat endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use apothecary_core::assistant::ChatTurn;
use apothecary_core::{MetricsSnapshot, RouteContext, RouteResponse};

use super::handlers::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Earlier turns, oldest first.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub metrics: MetricsSnapshot,
}

/// POST /api/v1/assistant/chat
///
/// Always answers once the message is non-empty: provider failures end in a
/// canned reply rather than an error status.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequestBody>,
) -> Result<Json<RouteResponse>, (StatusCode, Json<ErrorResponse>)> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("message must not be empty"),
        ));
    }

    let context = RouteContext {
        history: body.history,
        metrics: body.metrics,
    };
    let response = state
        .router()
        .route(message, body.conversation_id, &context)
        .await;

    info!(
        source = response.source.as_str(),
        locale = response.locale.code(),
        "Chat answered"
    );
    Ok(Json(response))
}
