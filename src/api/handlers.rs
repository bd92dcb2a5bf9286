//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::{CacheRegistry, CacheStats, RegistryStats};
use crate::config::RegistryConfig;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, InvalidateParams, InvalidateResponse};

/// Application state shared across all handlers.
///
/// Holds the registry owned by the composition root.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CacheRegistry>,
}

impl AppState {
    /// Creates a new AppState around an existing registry.
    pub fn new(registry: Arc<CacheRegistry>) -> Self {
        Self { registry }
    }

    /// Creates a new AppState with a registry built from configuration.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(Arc::new(CacheRegistry::new(config.clone())))
    }
}

/// Handler for GET /stats
///
/// Returns per-cache statistics plus aggregated totals.
pub async fn registry_stats_handler(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.registry.registry_stats())
}

/// Handler for GET /stats/:name
///
/// Returns statistics of one cache without creating it. Profiled caches not
/// yet in use report zeros; any other unknown name is a 404.
pub async fn cache_stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheStats>> {
    state
        .registry
        .peek_stats(&name)
        .map(Json)
        .ok_or_else(|| CacheError::NotFound(format!("No cache named '{}'", name)))
}

/// Handler for DELETE /caches/:name
///
/// Removes one key when `?key=` is given, otherwise clears the cache.
/// Unknown caches and keys are not an error.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<InvalidateParams>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = params.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.registry.invalidate(&name, params.key.as_deref());

    Ok(Json(InvalidateResponse::new(name, params.key)))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.registry.cache_names().len()))
}
