//! Dashboard monitor wiring.

use std::sync::Arc;

use usagemon_core::{PollSource, RateLimitSnapshot, UsageSummary};
use usagemon_fetch::HttpClient;
use usagemon_providers::{CostReportSource, RateLimitSource};
use usagemon_store::{ResolvedConfig, SourcePlan};

/// Month-to-date cost monitor backed by the Admin API.
///
/// Rebinds whenever the admin key changes.
pub fn cost_plan(client: HttpClient) -> SourcePlan<UsageSummary> {
    SourcePlan::new("api-usage", move |config: &ResolvedConfig| {
        let source = CostReportSource::new(client.clone(), config.anthropic.admin_api_key.clone());
        Arc::new(source) as Arc<dyn PollSource<Output = UsageSummary>>
    })
    .with_enabled(|config| config.anthropic.enabled && config.display.show_api_usage)
    .with_identity(|config| config.anthropic.admin_api_key.clone().unwrap_or_default())
}

/// Rate-limit monitor backed by the stored OAuth token.
pub fn rate_limit_plan(client: HttpClient) -> SourcePlan<RateLimitSnapshot> {
    SourcePlan::new("rate-limits", move |config: &ResolvedConfig| {
        let source = RateLimitSource::new(client.clone(), config.oauth.show_profile);
        Arc::new(source) as Arc<dyn PollSource<Output = RateLimitSnapshot>>
    })
    .with_enabled(|config| config.oauth.enabled && config.display.show_rate_limits)
    .with_identity(|config| config.oauth.show_profile.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_plan_toggle() {
        let plan = cost_plan(HttpClient::new());
        let mut config = ResolvedConfig::default();
        assert!(plan.is_enabled(&config));

        config.display.show_api_usage = false;
        assert!(!plan.is_enabled(&config));

        config.display.show_api_usage = true;
        config.anthropic.enabled = false;
        assert!(!plan.is_enabled(&config));
    }

    #[test]
    fn test_rate_limit_plan_toggle() {
        let plan = rate_limit_plan(HttpClient::new());
        let mut config = ResolvedConfig::default();
        assert_eq!(plan.name(), "rate-limits");
        assert!(plan.is_enabled(&config));

        config.oauth.enabled = false;
        assert!(!plan.is_enabled(&config));
    }
}
