//! Response DTOs for the state store
//!
//! Defines the JSON bodies returned over HTTP and by the state tool.

use serde::Serialize;
use serde_json::Value;

use crate::error::StateError;
use crate::store::{EntryMeta, SetOutcome, StoredValue, ValueType};

/// Response body for the SET operation
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    pub success: bool,
    /// The key that was set
    pub key: String,
    /// Serialized size in bytes
    pub size: usize,
    /// Effective TTL in milliseconds, null when the entry never expires
    pub ttl: Option<u64>,
}

impl From<SetOutcome> for SetResponse {
    fn from(outcome: SetOutcome) -> Self {
        Self {
            success: true,
            key: outcome.key,
            size: outcome.size,
            ttl: outcome.ttl,
        }
    }
}

/// Response body for the GET operation
///
/// `{"found": false}` when the key is missing or expired.
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
}

impl From<Option<StoredValue>> for GetResponse {
    fn from(stored: Option<StoredValue>) -> Self {
        match stored {
            Some(stored) => Self {
                found: true,
                value: Some(stored.value),
                value_type: Some(stored.value_type),
            },
            None => Self {
                found: false,
                value: None,
                value_type: None,
            },
        }
    }
}

/// Response body for the META operation
#[derive(Debug, Clone, Serialize)]
pub struct MetaResponse {
    pub found: bool,
    #[serde(flatten)]
    pub meta: Option<EntryMeta>,
}

impl From<Option<EntryMeta>> for MetaResponse {
    fn from(meta: Option<EntryMeta>) -> Self {
        Self {
            found: meta.is_some(),
            meta,
        }
    }
}

/// Response body for the DELETE operation
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub key: String,
    /// Whether a row was actually removed
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, deleted: bool) -> Self {
        Self {
            success: true,
            key: key.into(),
            deleted,
        }
    }
}

/// Response body for the CLEAR operation
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    /// Number of rows removed, expired ones included
    pub cleared: u64,
}

impl ClearResponse {
    pub fn new(cleared: u64) -> Self {
        Self {
            success: true,
            cleared,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
    /// Computed size of a rejected value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    /// Present and true when the call may succeed if repeated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            size: None,
            retryable: None,
        }
    }
}

impl From<&StateError> for ErrorResponse {
    fn from(err: &StateError) -> Self {
        let mut response = Self::new(err.to_string());
        if let StateError::ValueTooLarge { size, .. } = err {
            response.size = Some(*size);
        }
        if err.is_retryable() {
            response.retryable = Some(true);
        }
        response
    }
}
