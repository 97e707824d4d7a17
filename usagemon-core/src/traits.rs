//! Trait definitions for usagemon.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{ProviderCredentials, ProviderKind, TimePeriod, UsageData};

/// A per-provider usage adapter.
///
/// Implementations translate one provider's usage endpoint into
/// [`UsageData`]. They do not retry; callers decide when to call again.
#[async_trait]
pub trait UsageProvider: Send + Sync {
    /// Returns the kind of provider this implementation handles.
    fn kind(&self) -> ProviderKind;

    /// Returns the display name for this provider.
    fn display_name(&self) -> &str {
        self.kind().display_name()
    }

    /// Returns true if `credentials` are sufficient to attempt a fetch.
    fn is_configured(&self, credentials: &ProviderCredentials) -> bool;

    /// Fetches usage for `period`.
    async fn fetch_usage(
        &self,
        credentials: &ProviderCredentials,
        period: &TimePeriod,
    ) -> Result<UsageData, ApiError>;
}

/// A single-payload data source driven by a polling monitor.
///
/// Unlike [`UsageProvider`], a poll source is already bound to its
/// credentials and period; each call returns the current payload.
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    /// Payload produced on success.
    type Output: Clone + Send + Sync + 'static;

    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetches the current payload.
    async fn poll(&self) -> Result<Self::Output, ApiError>;
}
