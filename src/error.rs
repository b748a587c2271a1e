//! Error types for the state store
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// SQLite primary result codes that mean another connection holds the lock.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

// == State Error Enum ==
/// Unified error type for the state store.
#[derive(Error, Debug)]
pub enum StateError {
    /// Missing or empty argument
    #[error("{0}")]
    Validation(String),

    /// Serialized value is over the size limit
    #[error("Value exceeds {limit} bytes")]
    ValueTooLarge { size: usize, limit: usize },

    /// Value cannot be encoded as JSON
    #[error("not serializable")]
    NotSerializable,

    /// Request body the HTTP layer could not decode
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Lock wait exceeded; the caller may retry
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Any other database failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored row could not be decoded
    #[error("Corrupt entry: {0}")]
    Corrupt(String),

    /// Filesystem failure while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StateError {
    /// True when repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StateError::Busy(_))
    }
}

impl From<sqlx::Error> for StateError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => StateError::Busy(err.to_string()),
            sqlx::Error::Database(db) if is_lock_contention(db.code().as_deref()) => {
                StateError::Busy(db.message().to_string())
            }
            _ => StateError::Storage(err.to_string()),
        }
    }
}

fn is_lock_contention(code: Option<&str>) -> bool {
    // sqlx reports the extended code; the low byte is the primary code
    code.and_then(|c| c.parse::<i32>().ok())
        .map(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}

impl From<JsonRejection> for StateError {
    fn from(rejection: JsonRejection) -> Self {
        StateError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for StateError {
    fn into_response(self) -> Response {
        let status = match &self {
            StateError::Validation(_) | StateError::NotSerializable => StatusCode::BAD_REQUEST,
            StateError::ValueTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            StateError::Rejected { status, .. } => *status,
            StateError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
            StateError::Storage(_) | StateError::Corrupt(_) | StateError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the state store.
pub type Result<T> = std::result::Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_contention_codes() {
        assert!(is_lock_contention(Some("5")));
        assert!(is_lock_contention(Some("6")));
        // SQLITE_BUSY_SNAPSHOT
        assert!(is_lock_contention(Some("517")));
        assert!(!is_lock_contention(Some("19")));
        assert!(!is_lock_contention(Some("not a code")));
        assert!(!is_lock_contention(None));
    }

    #[test]
    fn test_pool_timeout_is_busy() {
        let err = StateError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_sqlx_errors_are_storage() {
        let err = StateError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StateError::Storage(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_size_error_message() {
        let err = StateError::ValueTooLarge {
            size: 2_000_000,
            limit: 1_048_576,
        };
        assert_eq!(err.to_string(), "Value exceeds 1048576 bytes");
    }

    #[test]
    fn test_not_serializable_message() {
        assert_eq!(StateError::NotSerializable.to_string(), "not serializable");
    }

    #[test]
    fn test_rejection_keeps_status() {
        let err = StateError::Rejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "Expected request with `Content-Type: application/json`".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.into_response().status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (StateError::Validation("key is required".into()), StatusCode::BAD_REQUEST),
            (StateError::NotSerializable, StatusCode::BAD_REQUEST),
            (
                StateError::ValueTooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (StateError::Busy("locked".into()), StatusCode::SERVICE_UNAVAILABLE),
            (StateError::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
