//! Provider-related types.
//!
//! - [`ProviderKind`] - Enum of supported providers
//! - [`ProviderCredentials`] - Credentials handed to source adapters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Provider Kind
// ============================================================================

/// Supported LLM provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic
    Anthropic,
    /// OpenAI
    OpenAI,
    /// Google
    Google,
    /// OpenRouter
    OpenRouter,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::OpenAI => "OpenAI",
            Self::Google => "Google",
            Self::OpenRouter => "OpenRouter",
        }
    }

    /// Returns the CLI/config identifier for this provider.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
            Self::Google => "google",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Returns all provider kinds in configuration order.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::Anthropic, Self::OpenAI, Self::Google, Self::OpenRouter]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.cli_name() == needle)
            .ok_or_else(|| CoreError::ProviderNotFound(s.to_string()))
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Credentials for one provider.
///
/// Every field is optional; adapters decide which combination is enough via
/// `UsageProvider::is_configured`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    /// API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Organization ID (OpenAI).
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Project ID (Google).
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ProviderCredentials {
    /// Creates credentials holding only an API key.
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Overlays `explicit` on top of `self`; explicit fields win.
    #[must_use]
    pub fn merge(&self, explicit: &ProviderCredentials) -> Self {
        Self {
            api_key: explicit.api_key.clone().or_else(|| self.api_key.clone()),
            organization_id: explicit
                .organization_id
                .clone()
                .or_else(|| self.organization_id.clone()),
            project_id: explicit
                .project_id
                .clone()
                .or_else(|| self.project_id.clone()),
        }
    }

    /// Returns the API key if it is present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.organization_id.is_none() && self.project_id.is_none()
    }
}
