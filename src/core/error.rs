//! Typed error handling for tally
//!
//! Store backends report failures as `anyhow::Error`. Everything that reaches
//! a handler is a [`TallyError`], which knows its HTTP status and a stable
//! error code.
//!
//! # Error Categories
//!
//! - `NotFound`: a referenced customer, invoice, payment or item is absent
//! - `InvalidReference`: an identifier could not be parsed
//! - `Store`: the document store failed a read or write
//! - `Validation`: the request payload is unusable (e.g. a NaN amount)
//! - `Upload`: the multipart upload or the object store failed
//! - `Config`: configuration is missing or inconsistent
//!
//! # Example
//!
//! ```rust,ignore
//! let customer = customers
//!     .get(id)
//!     .await?
//!     .ok_or_else(|| TallyError::not_found(Customer::collection(), id))?;
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Result alias used across the engine and the handlers
pub type TallyResult<T> = std::result::Result<T, TallyError>;

/// The main error type
#[derive(Debug, Error)]
pub enum TallyError {
    /// A referenced document does not exist
    #[error("{collection} document '{id}' not found")]
    NotFound { collection: String, id: String },

    /// An identifier was malformed
    #[error("invalid reference '{value}': {message}")]
    InvalidReference { value: String, message: String },

    /// The document store failed
    #[error("store failure: {0:#}")]
    Store(#[source] anyhow::Error),

    /// The request payload was rejected before any write
    #[error("validation failed: {0}")]
    Validation(String),

    /// Multipart parsing or object storage failed
    #[error("upload failed: {0}")]
    Upload(String),

    /// Configuration is missing or inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// Should not happen in normal operation
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error body returned over HTTP
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl TallyError {
    pub fn not_found(collection: impl Into<String>, id: impl ToString) -> Self {
        TallyError::NotFound {
            collection: collection.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_reference(value: impl Into<String>, message: impl Into<String>) -> Self {
        TallyError::InvalidReference {
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn store(err: anyhow::Error) -> Self {
        TallyError::Store(err)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            TallyError::NotFound { .. } => StatusCode::NOT_FOUND,
            TallyError::InvalidReference { .. } => StatusCode::BAD_REQUEST,
            TallyError::Validation(_) => StatusCode::BAD_REQUEST,
            TallyError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TallyError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TallyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TallyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            TallyError::NotFound { .. } => "NOT_FOUND",
            TallyError::InvalidReference { .. } => "INVALID_REFERENCE",
            TallyError::Validation(_) => "VALIDATION_ERROR",
            TallyError::Store(_) => "STORE_FAILURE",
            TallyError::Upload(_) => "UPLOAD_ERROR",
            TallyError::Config(_) => "CONFIG_ERROR",
            TallyError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for TallyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }
        (status, Json(self.to_response())).into_response()
    }
}

impl From<serde_yaml::Error> for TallyError {
    fn from(err: serde_yaml::Error) -> Self {
        TallyError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_not_found_display() {
        let id = Uuid::nil();
        let err = TallyError::not_found("customer", id);
        assert!(err.to_string().contains("customer"));
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_status_codes_are_differentiated() {
        assert_eq!(
            TallyError::not_found("invoices", "x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TallyError::invalid_reference("zz", "bad uuid").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TallyError::Validation("total is NaN".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TallyError::store(anyhow::anyhow!("connection reset")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_keeps_context() {
        let err = TallyError::store(
            anyhow::anyhow!("connection reset").context("Failed to update customer"),
        );
        let msg = err.to_string();
        assert!(msg.contains("Failed to update customer"));
        assert!(msg.contains("connection reset"));
        assert_eq!(err.error_code(), "STORE_FAILURE");
    }

    #[test]
    fn test_invalid_reference_keeps_value() {
        let err = TallyError::invalid_reference("not-a-uuid", "invalid character");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("not-a-uuid"));
    }

    #[test]
    fn test_error_response_serialization() {
        let err = TallyError::not_found("payments", Uuid::nil());
        let response = err.to_response();
        assert_eq!(response.code, "NOT_FOUND");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json["message"].as_str().unwrap().contains("payments"));
    }
}
