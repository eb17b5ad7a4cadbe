pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use config::AppConfig;
pub use error::{AppError, ErrorResponse};

// Export logic types
pub use logic::{
    build_input_tree, ComputeClient, Endpoint, HttpComputeClient, RetryPolicy, SolveForwarder,
    SolveOutcome, StatusProbe,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{DefinitionStore, FsDefinitionStore, SolveCache};

use std::sync::Arc;

/// Wire the filesystem store and HTTP compute client into the application router
pub fn build_app(config: AppConfig) -> anyhow::Result<axum::Router> {
    let store = Arc::new(FsDefinitionStore::new(config.definitions.dir.clone()));
    let client = Arc::new(HttpComputeClient::new(config.compute.clone())?);
    let context = api::handlers::AppContext::new(store, client, config);
    Ok(api::routes::build_app(context))
}

/// Scan the definitions directory once and report what was found
pub async fn scan_definitions(config: &AppConfig) -> anyhow::Result<usize> {
    let store = FsDefinitionStore::new(config.definitions.dir.clone());
    let definitions = store.list().await?;
    for definition in &definitions {
        log::debug!("Found definition {}", definition.id);
    }
    Ok(definitions.len())
}
