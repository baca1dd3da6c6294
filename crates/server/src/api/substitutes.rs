//! Substitute ranking endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use apothecary_core::{Availability, MedicineRef, SubstitutionReport};

use super::handlers::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub reference: MedicineRef,
    #[serde(default)]
    pub candidates: Vec<MedicineRef>,
    /// Live availability by candidate id. Missing ids count as out of stock.
    #[serde(default)]
    pub availability: HashMap<String, Availability>,
    /// Capped by the configured maximum.
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// POST /api/v1/substitutes/rank
pub async fn rank(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RankRequest>,
) -> Result<Json<SubstitutionReport>, (StatusCode, Json<ErrorResponse>)> {
    if body.reference.id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("reference.id must not be empty"),
        ));
    }

    let scorer = state.scorer();
    let limit = body
        .max_results
        .map_or(scorer.max_results(), |n| n.min(scorer.max_results()));

    Ok(Json(scorer.rank_limited(
        &body.reference,
        &body.candidates,
        &body.availability,
        limit,
    )))
}
