use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::api::handlers::{self, AppContext, AppState};
use crate::api::solve_handlers;
use crate::store::traits::DefinitionStore;

pub fn create_router<S: DefinitionStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::compute_status::<S>))
        // Definitions
        .route("/files", get(handlers::list_files::<S>))
        .route("/definition/*reference", get(handlers::get_definition::<S>))
        .route("/io/*reference", get(handlers::describe_definition::<S>))
        // Solving
        .route("/solve", post(solve_handlers::solve::<S>))
        .route("/solve/*reference", get(solve_handlers::solve_from_query::<S>))
}

/// Full application: API routes, static frontend fallback and state
pub fn build_app<S: DefinitionStore + 'static>(context: AppContext<S>) -> Router {
    let router = match &context.config.static_files.dir {
        Some(dir) => create_router::<S>().fallback_service(ServeDir::new(dir)),
        None => create_router::<S>().fallback(handlers::not_found),
    };
    router.with_state(Arc::new(context))
}
