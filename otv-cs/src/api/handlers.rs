//! HTTP request handlers
//!
//! The read endpoint is deliberately thin: parse the path and query, hand
//! off to the orchestrator, serialize its view.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use otv_common::types::{ItemKind, TranslatedItemView};

use crate::api::server::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "catalog_service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct TranslationQuery {
    /// Target language code, e.g. `?lang=fr`.
    lang: Option<String>,
}

/// GET /catalog/:kind/:id - Catalog read, optionally translated
///
/// Returns the item with a `translation` block when `lang` is given:
/// `completed` carries the translated text, `pending` means a job is in
/// flight (or was just enqueued) and the client should poll again.
pub async fn get_catalog_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    Query(query): Query<TranslationQuery>,
) -> Result<Json<TranslatedItemView>, ApiError> {
    let kind: ItemKind = kind.parse()?;

    let view = state
        .orchestrator
        .resolve_translated_item(kind, id, query.lang.as_deref())
        .await?;

    Ok(Json(view))
}
