//! Error types for onboard
//!
//! Every failure here is scoped to a single request; nothing is fatal to the
//! process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::kennelish::ValidationErrors;

/// Main error type for onboard operations
#[derive(Debug, thiserror::Error)]
pub enum OnboardError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed JSON input.")]
    MalformedJson(String),

    /// Payload rejected by the generated validator or by the record type.
    /// The field detail is logged, never sent to the client.
    #[error("Malformed input")]
    MalformedInput(ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OnboardError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MalformedJson(_) => StatusCode::BAD_REQUEST,
            Self::MalformedInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OnboardError {
    fn into_response(self) -> Response {
        match &self {
            Self::MalformedInput(errors) => {
                tracing::info!(%errors, "Rejected form submission");
            }
            Self::MalformedJson(detail) => {
                tracing::info!(detail = %detail, "Rejected non-JSON body");
            }
            Self::Database(_) | Self::Internal(_) | Self::Schema(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => {}
        }

        (self.status_code(), self.to_string()).into_response()
    }
}

impl From<std::io::Error> for OnboardError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for OnboardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

impl From<rusqlite::Error> for OnboardError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for OnboardError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for onboard operations
pub type Result<T> = std::result::Result<T, OnboardError>;
