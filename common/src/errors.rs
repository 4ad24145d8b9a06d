//! Application error types.
//!
//! Every failure that can end a capability call is expressed as an [`AppError`].
//! Handlers return `Result<_, AppError>` and rely on the [`IntoResponse`] impl
//! below to produce the standard error envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required parameter is missing, mistyped or out of range.
    #[error("validation error: {0}")]
    Validation(String),

    /// No connection is registered under the given ID.
    #[error("database configuration not found for ID: {0}")]
    ConnectionNotFound(String),

    /// The capability name is not part of the catalog.
    #[error("unknown capability: {0}")]
    CapabilityNotFound(String),

    /// No builder exists for this (dialect, capability) pair.
    #[error("unsupported database type for {capability}: {dialect}")]
    UnsupportedDialect { dialect: String, capability: String },

    /// A statement failed against the backend.
    #[error("execution error: {0}")]
    Execution(String),

    /// A connection pool could not be created.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// The caller cancelled the call before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// The call exceeded its time budget.
    #[error("operation timed out after {0}s")]
    Timeout(u64),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds an `UnsupportedDialect` error.
    pub fn unsupported(dialect: impl Into<String>, capability: impl Into<String>) -> Self {
        AppError::UnsupportedDialect {
            dialect: dialect.into(),
            capability: capability.into(),
        }
    }

    /// Stable error code used in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::ConnectionNotFound(_) | AppError::CapabilityNotFound(_) => "NOT_FOUND",
            AppError::UnsupportedDialect { .. } => "UNSUPPORTED_DIALECT",
            AppError::Execution(_) => "EXECUTION_ERROR",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::Cancelled => "CANCELLED",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ConnectionNotFound(_) | AppError::CapabilityNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::UnsupportedDialect { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Execution(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        (status, Json(ApiResponse::err(self.code(), self.to_string()))).into_response()
    }
}
