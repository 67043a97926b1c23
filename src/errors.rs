use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "error": "ConflictError",
    "message": "Insufficient stock in source warehouse (available 3, requested 5)",
    "requestId": "2b1f0c4e-8d7a-4a51-9d3c-6e2f1d1b7a90",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Error category
    #[schema(example = "ValidationError")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Source and destination must differ")]
    pub message: String,
    /// Request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error occurred
    pub timestamp: String,
}

/// Category of a [`ServiceError`], rendered as the `error` field of the body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Input names a product or warehouse that does not exist
    Reference,
    /// Request is well-formed but conflicts with current stock
    Conflict,
    NotFound,
    MethodNotAllowed,
    /// I/O, serialization, anything unexpected
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Internal => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Missing or invalid fields: {0}")]
    MissingField(String),

    #[error("Quantity must be greater than 0")]
    InvalidQuantity,

    #[error("Source and destination must differ")]
    SameWarehouse,

    #[error("{0}")]
    ValidationError(String),

    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Warehouse {0} not found")]
    WarehouseNotFound(i64),

    #[error("Source warehouse {0} not found")]
    SourceWarehouseNotFound(i64),

    #[error("Destination warehouse {0} not found")]
    DestinationWarehouseNotFound(i64),

    #[error("Insufficient stock in source warehouse (available {available}, requested {requested})")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Stock invariant violated: {0}")]
    InvariantViolation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn not_found(what: &str, id: i64) -> Self {
        ServiceError::NotFound(format!("{} {} not found", what, id))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_)
            | Self::InvalidQuantity
            | Self::SameWarehouse
            | Self::ValidationError(_) => ErrorKind::Validation,
            Self::ProductNotFound(_)
            | Self::WarehouseNotFound(_)
            | Self::SourceWarehouseNotFound(_)
            | Self::DestinationWarehouseNotFound(_) => ErrorKind::Reference,
            Self::InsufficientStock { .. } | Self::InvariantViolation(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            Self::Store(_) | Self::InternalError(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Reference | ErrorKind::Conflict => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to callers. Internal failures are reduced to a
    /// generic message.
    pub fn response_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();
        let request_id = current_request_id();

        if kind == ErrorKind::Internal {
            error!(
                error = %self,
                request_id = request_id.as_deref().unwrap_or("-"),
                "Request failed"
            );
        }

        let body = ErrorResponse {
            error: kind.to_string(),
            message: self.response_message(),
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}
