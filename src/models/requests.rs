//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request parameters.

use serde::Deserialize;

/// Query parameters of DELETE /caches/:name
///
/// # Fields
/// - `key`: Entry to remove; the whole cache is cleared when absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateParams {
    #[serde(default)]
    pub key: Option<String>,
}

impl InvalidateParams {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match &self.key {
            Some(key) if key.is_empty() => Some("Key cannot be empty".to_string()),
            _ => None,
        }
    }
}
