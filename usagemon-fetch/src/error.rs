//! Fetch error types.

use thiserror::Error;
use usagemon_core::{ApiError, ApiErrorKind};

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The remote answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Returns the HTTP status, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status { status, message } => ApiError::from_status(status, message),
            FetchError::Http(HttpError::Request(ref e)) if e.is_decode() => {
                ApiError::new(ApiErrorKind::Api, err.to_string())
            }
            FetchError::Http(HttpError::Request(_)) => ApiError::network(err.to_string()),
            FetchError::Http(_) | FetchError::Json(_) => {
                ApiError::new(ApiErrorKind::Api, err.to_string())
            }
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        FetchError::from(err).into()
    }
}

// ============================================================================
// Tests
// ============================================================================
