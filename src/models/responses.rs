//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies. Stats endpoints
//! serialize [`CacheStats`](crate::cache::CacheStats) and
//! [`RegistryStats`](crate::cache::RegistryStats) directly.

use serde::Serialize;

/// Response body for DELETE /caches/:name
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// The cache that was targeted
    pub cache: String,
    /// The key that was removed, None when the cache was cleared
    pub key: Option<String>,
}

impl InvalidateResponse {
    pub fn new(cache: impl Into<String>, key: Option<String>) -> Self {
        let cache = cache.into();
        let message = match &key {
            Some(key) => format!("Key '{}' invalidated in cache '{}'", key, cache),
            None => format!("Cache '{}' cleared", cache),
        };
        Self {
            message,
            cache,
            key,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Number of caches currently in the registry
    pub caches: usize,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(caches: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            caches,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_key_response() {
        let resp = InvalidateResponse::new("permissions", Some("u1".to_string()));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["cache"], "permissions");
        assert_eq!(json["key"], "u1");
        assert!(resp.message.contains("invalidated"));
    }

    #[test]
    fn test_invalidate_cache_response() {
        let resp = InvalidateResponse::new("userData", None);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["key"].is_null());
        assert!(resp.message.contains("cleared"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(3);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert!(json.contains("\"caches\":3"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
