//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps resolver, auth and metadata errors to HTTP status codes with a JSON
//! body carrying a machine-readable code and a message. Internal details are
//! logged, never returned.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use depot_auth::AuthError;
use depot_core::InvalidPath;
use depot_metadata::MetadataError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message returned for every refused deploy while deployment is off.
pub const DEPLOYMENT_DISABLED_MESSAGE: &str = "Artifact deployment is disabled";

const CHALLENGE: &str = "Basic realm=\"depot\"";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "INVALID_PATH").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Path cannot be normalized or escapes the repository root (400).
    #[error("invalid path: {0}")]
    InvalidPath(#[from] InvalidPath),

    /// Upload body could not be decoded (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing, unknown, mismatched or disabled credential, or a write outside
    /// the session's prefix (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Nothing is stored at the resolved location (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Anything other than GET, HEAD or PUT (404).
    #[error("Unknown method")]
    MethodNotAllowed(String),

    /// Deploys are administratively switched off (500).
    #[error("Artifact deployment is disabled")]
    DeploymentDisabled,

    /// Unhandled fault (500). Message is logged and kept in the fault history.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidPath(_) => (StatusCode::BAD_REQUEST, "INVALID_PATH"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::MethodNotAllowed(_) => (StatusCode::NOT_FOUND, "UNKNOWN_METHOD"),
            Self::DeploymentDisabled => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DEPLOYMENT_DISABLED")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "Cannot serve request".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
        }
        response
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

impl From<MetadataError> for AppError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(directory) => Self::NotFound(directory),
            other => Self::Internal(other.to_string()),
        }
    }
}
