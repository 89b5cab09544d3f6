//! HTTP server setup and routing

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::translation::TranslationOrchestrator;

/// Shared application context passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TranslationOrchestrator>,
}

/// Build the catalog service router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        .route("/catalog/:kind/:id", get(super::handlers::get_catalog_item))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
