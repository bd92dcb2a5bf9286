//! Error types for the cache registry
//!
//! Provides unified error handling using thiserror.
//!
//! Cache reads and writes never fail: misses and expiry are plain return
//! values. Errors only come from configuration and from the admin surface.
//! Failures of a `get_or_set` producer are the caller's own error type and
//! are handed back untouched.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache registry.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A cache profile or registry setting was rejected
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// No cache by that name on the admin surface
    #[error("Cache not found: {0}")]
    NotFound(String),

    /// Invalid request data on the admin surface
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::InvalidConfig(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache registry.
pub type Result<T> = std::result::Result<T, CacheError>;
