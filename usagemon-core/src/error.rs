//! Core error types for usagemon.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::ProviderKind;

/// Core error type for usagemon operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Provider not found or not configured.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// API Error Taxonomy
// ============================================================================

/// Closed classification of remote fetch failures.
///
/// Every failure a source adapter can produce maps onto exactly one of
/// these kinds. None of them is fatal; a monitor keeps polling after any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// No credentials were configured for the source.
    CredentialsMissing,
    /// Credentials exist but are malformed or expired.
    CredentialsInvalid,
    /// The remote rejected the credentials (401/403).
    Authentication,
    /// The remote is throttling us (429).
    RateLimit,
    /// The endpoint does not exist (404).
    NotFound,
    /// Any other non-success response.
    Api,
    /// Transport failure, timeout or unreadable response.
    Network,
}

impl ApiErrorKind {
    /// Classifies an HTTP status code.
    ///
    /// Status `0` stands for "no response at all" and maps to
    /// [`ApiErrorKind::Network`].
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => Self::Network,
            401 | 403 => Self::Authentication,
            404 => Self::NotFound,
            429 => Self::RateLimit,
            _ => Self::Api,
        }
    }

    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialsMissing => "credentials_missing",
            Self::CredentialsInvalid => "credentials_invalid",
            Self::Authentication => "authentication_error",
            Self::RateLimit => "rate_limit_error",
            Self::NotFound => "not_found_error",
            Self::Api => "api_error",
            Self::Network => "network_error",
        }
    }

    /// Returns true for failures caused by local credential state.
    pub fn is_credentials(&self) -> bool {
        matches!(self, Self::CredentialsMissing | Self::CredentialsInvalid)
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure returned by a source adapter.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ApiError {
    /// Failure classification.
    pub kind: ApiErrorKind,
    /// Human-readable message.
    pub message: String,
    /// HTTP status, when the failure came from a response.
    pub status_code: Option<u16>,
    /// Provider that produced the failure.
    pub provider: Option<ProviderKind>,
}

impl ApiError {
    /// Creates an error of the given kind.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            provider: None,
        }
    }

    /// Creates an error from an HTTP status and response message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            message: message.into(),
            status_code: Some(status),
            provider: None,
        }
    }

    /// No credentials configured.
    pub fn credentials_missing(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::CredentialsMissing, message)
    }

    /// Credentials present but unusable.
    pub fn credentials_invalid(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::CredentialsInvalid, message)
    }

    /// Transport-level failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    /// Attaches a status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Tags the error with the provider that produced it.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = self.provider {
            write!(f, "[{}] ", provider.cli_name())?;
        }
        f.write_str(&self.message)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ApiErrorKind::from_status(401), ApiErrorKind::Authentication);
        assert_eq!(ApiErrorKind::from_status(403), ApiErrorKind::Authentication);
        assert_eq!(ApiErrorKind::from_status(404), ApiErrorKind::NotFound);
        assert_eq!(ApiErrorKind::from_status(429), ApiErrorKind::RateLimit);
        assert_eq!(ApiErrorKind::from_status(500), ApiErrorKind::Api);
        assert_eq!(ApiErrorKind::from_status(0), ApiErrorKind::Network);
    }

    #[test]
    fn test_display_prefixes_provider() {
        let err = ApiError::from_status(429, "slow down").with_provider(ProviderKind::OpenAI);
        assert_eq!(err.to_string(), "[openai] slow down");
        assert_eq!(err.status_code, Some(429));

        let bare = ApiError::credentials_missing("No API key configured");
        assert_eq!(bare.to_string(), "No API key configured");
        assert!(bare.kind.is_credentials());
    }

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&ApiErrorKind::RateLimit).unwrap();
        assert_eq!(json, "\"rate_limit\"");
        assert_eq!(ApiErrorKind::RateLimit.as_str(), "rate_limit_error");
    }
}
