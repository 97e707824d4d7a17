//! Anthropic integrations.
//!
//! - [`admin`] - Admin API cost and Claude Code usage reports
//! - [`oauth`] - Subscription rate limits and profile
//! - [`credentials`] - Claude CLI OAuth credential loading
//! - [`usage`] - Per-period usage adapter for the aggregator

pub mod admin;
pub mod credentials;
pub mod oauth;
pub mod usage;

pub use admin::{
    AnthropicAdminApi, ClaudeCodeActor, ClaudeCodeUsageParams, ClaudeCodeUsageReport,
    CostGroupBy, CostReport, CostReportParams,
};
pub use credentials::{CredentialSource, CredentialsError, OAuthCredentials, TokenExpiry};
pub use oauth::ClaudeOAuthApi;
pub use usage::AnthropicUsageProvider;
