use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{AppError, ErrorResponse};
use crate::logic::{ComputeClient, SolveForwarder, StatusProbe};
use crate::model::{DefinitionRecord, StatusReport};
use crate::store::{DefinitionStore, SolveCache};

/// Everything a request handler needs, built once at startup
pub struct AppContext<S: DefinitionStore> {
    pub store: Arc<S>,
    pub forwarder: SolveForwarder<S>,
    pub status: StatusProbe,
    pub config: AppConfig,
}

pub type AppState<S> = Arc<AppContext<S>>;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

impl<S: DefinitionStore> AppContext<S> {
    pub fn new(store: Arc<S>, client: Arc<dyn ComputeClient>, config: AppConfig) -> Self {
        let cache = SolveCache::from_config(&config.cache);
        let forwarder = SolveForwarder::new(Arc::clone(&store), Arc::clone(&client), cache, &config);
        let status = StatusProbe::new(client, &config.compute);
        Self {
            store,
            forwarder,
            status,
            config,
        }
    }

    /// Translate an error into the HTTP response for this deployment
    pub fn fail(&self, error: AppError) -> ApiError {
        let (status, body) = error.to_response(self.config.server.production);
        if status.is_server_error() {
            log::error!("{}", error);
        } else {
            log::debug!("{}", error);
        }
        (status, Json(body))
    }
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /status
/// Always 200; compute failures are reported in the body
pub async fn compute_status<S: DefinitionStore>(
    State(state): State<AppState<S>>,
) -> Json<StatusReport> {
    Json(state.status.check().await)
}

/// GET /files
pub async fn list_files<S: DefinitionStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<ListResponse<DefinitionRecord>>, ApiError> {
    match state.store.list().await {
        Ok(items) => {
            let total = items.len();
            Ok(Json(ListResponse { items, total }))
        }
        Err(e) => Err(state.fail(e)),
    }
}

/// GET /definition/{reference}
/// Raw definition bytes, also what compute fetches in pointer mode
pub async fn get_definition<S: DefinitionStore>(
    State(state): State<AppState<S>>,
    Path(reference): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.store.resolve(&reference).await.map_err(|e| state.fail(e))?;
    let source = state.store.load(&record).await.map_err(|e| state.fail(e))?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        source.bytes,
    )
        .into_response())
}

/// GET /io/{reference}
/// Input and output parameters of a definition, as reported by compute
pub async fn describe_definition<S: DefinitionStore>(
    State(state): State<AppState<S>>,
    Path(reference): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.forwarder.io(&reference).await {
        Ok(description) => Ok(Json(description)),
        Err(e) => Err(state.fail(e)),
    }
}

/// Fallback when no static directory is configured
pub async fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("not_found", "No such route")),
    )
}
