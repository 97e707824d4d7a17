//! Provider registry.
//!
//! Static table of every usage provider: how to build its adapter and which
//! environment variables carry its credentials.

use std::sync::OnceLock;
use usagemon_core::{ProviderCredentials, ProviderKind, UsageProvider};
use usagemon_fetch::HttpClient;

use crate::anthropic::AnthropicUsageProvider;
use crate::google::GoogleUsageProvider;
use crate::openai::OpenAIUsageProvider;
use crate::openrouter::OpenRouterUsageProvider;

// ============================================================================
// Descriptor
// ============================================================================

/// Environment variables holding one provider's credentials.
#[derive(Debug, Clone, Copy)]
pub struct EnvCredentialVars {
    /// API key variable.
    pub api_key: &'static str,
    /// Organization ID variable.
    pub organization_id: Option<&'static str>,
    /// Project ID variable.
    pub project_id: Option<&'static str>,
}

/// Static configuration for a provider.
pub struct ProviderDescriptor {
    /// Provider identifier.
    pub id: ProviderKind,
    /// Credential environment variables.
    pub env: EnvCredentialVars,
    /// Builds the adapter.
    pub build: fn(&HttpClient) -> Box<dyn UsageProvider>,
}

impl ProviderDescriptor {
    /// Builds the adapter for this provider.
    pub fn build_provider(&self, client: &HttpClient) -> Box<dyn UsageProvider> {
        (self.build)(client)
    }

    /// Reads credentials from the environment through `lookup`.
    ///
    /// Blank values count as unset.
    pub fn env_credentials<F>(&self, lookup: F) -> ProviderCredentials
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: Option<&str>| {
            name.and_then(&lookup).filter(|v| !v.trim().is_empty())
        };
        ProviderCredentials {
            api_key: read(Some(self.env.api_key)),
            organization_id: read(self.env.organization_id),
            project_id: read(self.env.project_id),
        }
    }
}

// ============================================================================
// Static Registry
// ============================================================================

static DESCRIPTORS: OnceLock<Vec<ProviderDescriptor>> = OnceLock::new();

fn init_descriptors() -> Vec<ProviderDescriptor> {
    vec![
        ProviderDescriptor {
            id: ProviderKind::Anthropic,
            env: EnvCredentialVars {
                api_key: "ANTHROPIC_API_KEY",
                organization_id: None,
                project_id: None,
            },
            build: |client| Box::new(AnthropicUsageProvider::new(client.clone())),
        },
        ProviderDescriptor {
            id: ProviderKind::OpenAI,
            env: EnvCredentialVars {
                api_key: "OPENAI_API_KEY",
                organization_id: Some("OPENAI_ORG_ID"),
                project_id: None,
            },
            build: |client| Box::new(OpenAIUsageProvider::new(client.clone())),
        },
        ProviderDescriptor {
            id: ProviderKind::Google,
            env: EnvCredentialVars {
                api_key: "GOOGLE_API_KEY",
                organization_id: None,
                project_id: Some("GOOGLE_PROJECT_ID"),
            },
            build: |_| Box::new(GoogleUsageProvider),
        },
        ProviderDescriptor {
            id: ProviderKind::OpenRouter,
            env: EnvCredentialVars {
                api_key: "OPENROUTER_API_KEY",
                organization_id: None,
                project_id: None,
            },
            build: |client| Box::new(OpenRouterUsageProvider::new(client.clone())),
        },
    ]
}

/// Global registry of provider descriptors, in configuration order.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Returns all provider descriptors.
    pub fn all() -> &'static [ProviderDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Gets a provider descriptor by kind.
    pub fn get(id: ProviderKind) -> Option<&'static ProviderDescriptor> {
        Self::all().iter().find(|d| d.id == id)
    }

    /// Looks up a provider by CLI name.
    pub fn get_by_cli_name(name: &str) -> Option<&'static ProviderDescriptor> {
        let kind = name.parse::<ProviderKind>().ok()?;
        Self::get(kind)
    }

    /// Builds every adapter in registry order.
    pub fn build_all(client: &HttpClient) -> Vec<Box<dyn UsageProvider>> {
        Self::all().iter().map(|d| d.build_provider(client)).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
