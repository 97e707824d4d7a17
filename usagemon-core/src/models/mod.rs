//! Domain models for usagemon.

mod provider;
mod rate_limit;
mod usage;

pub use provider::{ProviderCredentials, ProviderKind};
pub use rate_limit::{
    AccountInfo, OrganizationInfo, ProfileData, RateLimitSnapshot, RateLimitState,
    RateLimitWindow,
};
pub use usage::{CostInfo, ModelUsage, TimePeriod, TokenUsage, UsageData, UsageSummary};
