// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usagemon Core
//!
//! Core types, models, and traits shared by every usagemon crate.
//!
//! ## Key Types
//!
//! ### Provider Types
//! - [`ProviderKind`] - Enum of supported LLM providers
//! - [`ProviderCredentials`] - API key / organization / project credentials
//!
//! ### Usage Types
//! - [`UsageData`] - Normalized per-provider usage for a period
//! - [`TokenUsage`] - Token counts (`total == input + output`)
//! - [`CostInfo`] - Cost amount and currency
//! - [`TimePeriod`] - Reporting period
//! - [`UsageSummary`] - Month-to-date organization totals
//!
//! ### Rate Limits
//! - [`RateLimitSnapshot`] - Rate-limit windows plus profile
//! - [`RateLimitWindow`] - One rolling window
//!
//! ### Errors
//! - [`ApiError`] / [`ApiErrorKind`] - Classified adapter failures

pub mod error;
pub mod models;
pub mod traits;

pub use error::{ApiError, ApiErrorKind, CoreError};

pub use models::{
    // Provider types
    ProviderCredentials,
    ProviderKind,
    // Usage types
    CostInfo,
    ModelUsage,
    TimePeriod,
    TokenUsage,
    UsageData,
    UsageSummary,
    // Rate limits
    AccountInfo,
    OrganizationInfo,
    ProfileData,
    RateLimitSnapshot,
    RateLimitState,
    RateLimitWindow,
};

pub use traits::{PollSource, UsageProvider};
