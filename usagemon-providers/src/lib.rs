// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usagemon Providers
//!
//! Remote API clients and adapters for every supported provider.
//!
//! ## Supported Providers
//!
//! | Provider | Usage adapter | Extra |
//! |----------|---------------|-------|
//! | Anthropic | `/v1/organizations/usage` | Admin cost report, Claude Code usage, OAuth rate limits |
//! | OpenAI | `/v1/organization/usage` | tokens only |
//! | Google | not yet available | |
//! | OpenRouter | `/api/v1/auth/key` | credits |
//!
//! ## Usage
//!
//! ```ignore
//! use usagemon_providers::ProviderRegistry;
//! use usagemon_fetch::HttpClient;
//!
//! let providers = ProviderRegistry::build_all(&HttpClient::new());
//! for provider in &providers {
//!     let data = provider.fetch_usage(&credentials, &period).await?;
//! }
//! ```

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod openrouter;
pub mod registry;
pub mod sources;

pub use anthropic::{
    AnthropicAdminApi, AnthropicUsageProvider, ClaudeOAuthApi, CredentialsError,
    OAuthCredentials,
};
pub use google::GoogleUsageProvider;
pub use openai::OpenAIUsageProvider;
pub use openrouter::OpenRouterUsageProvider;
pub use registry::{EnvCredentialVars, ProviderDescriptor, ProviderRegistry};
pub use sources::{CostReportSource, RateLimitSource};
