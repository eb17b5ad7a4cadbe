use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

use crate::api::handlers::{ApiError, AppState};
use crate::error::AppError;
use crate::logic::SolveOutcome;
use crate::model::{SolveInputs, SolveRequest};
use crate::store::DefinitionStore;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// POST /solve
/// Body: `{ "definition": "...", "inputs": { name: scalar | [scalar] } }`
pub async fn solve<S: DefinitionStore>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: SolveRequest = serde_json::from_slice(&body)
        .map_err(|e| state.fail(AppError::MalformedInput(e.to_string())))?;
    let inputs = SolveInputs::from_json(request.inputs.as_ref()).map_err(|e| state.fail(e))?;

    let outcome = state
        .forwarder
        .solve(&request.definition, &inputs)
        .await
        .map_err(|e| state.fail(e))?;
    solve_response(outcome).map_err(|e| state.fail(e))
}

/// GET /solve/{reference}?name=value&...
/// Query values are typed as boolean, integer, number, then text
pub async fn solve_from_query<S: DefinitionStore>(
    State(state): State<AppState<S>>,
    Path(reference): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let inputs = SolveInputs::from_query(&query).map_err(|e| state.fail(e))?;
    let outcome = state
        .forwarder
        .solve(&reference, &inputs)
        .await
        .map_err(|e| state.fail(e))?;
    solve_response(outcome).map_err(|e| state.fail(e))
}

fn solve_response(outcome: SolveOutcome) -> Result<Response, AppError> {
    let body = serde_json::to_vec(outcome.result.as_ref())
        .map_err(|e| AppError::Internal(format!("failed to encode solve result: {}", e)))?;
    let cache_status = if outcome.cached { "HIT" } else { "MISS" };

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (X_CACHE, cache_status),
        ],
        body,
    )
        .into_response())
}
