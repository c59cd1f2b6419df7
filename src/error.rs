//! Error types for the file cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == File Cache Error Enum ==
/// Unified error type for the file cache and its HTTP front-end.
#[derive(Error, Debug)]
pub enum FileCacheError {
    /// Hash depth outside the supported 1..=4 range
    #[error("Invalid hash depth {0}: must be between 1 and 4")]
    InvalidHashDepth(u8),

    /// Value cannot be written as a static literal
    #[error("Value is not representable as a static literal: {0}")]
    Unrepresentable(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Entry file does not start with a valid expiration header
    #[error("Corrupt cache entry {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// Filesystem failure
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FileCacheError {
    /// Wraps an I/O error with a description of the failed operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Builds a corruption error for the entry at `path`.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for FileCacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            FileCacheError::InvalidHashDepth(_)
            | FileCacheError::Unrepresentable(_)
            | FileCacheError::Serialization(_)
            | FileCacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            FileCacheError::NotFound(_) => StatusCode::NOT_FOUND,
            FileCacheError::Corrupt { .. }
            | FileCacheError::Io { .. }
            | FileCacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the file cache.
pub type Result<T> = std::result::Result<T, FileCacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message_includes_context() {
        let err = FileCacheError::io(
            "creating cache directory",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("creating cache directory"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_corrupt_error_message_includes_path() {
        let err = FileCacheError::corrupt("/tmp/x.cache", "missing header");
        assert_eq!(
            err.to_string(),
            "Corrupt cache entry /tmp/x.cache: missing header"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            FileCacheError::InvalidHashDepth(7).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FileCacheError::NotFound("k".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            FileCacheError::corrupt("p", "r").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
