//! Subscription rate-limit and profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One rolling rate-limit window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitWindow {
    /// Percent of the window consumed (0-100).
    pub utilization: f64,
    /// When the window resets.
    pub resets_at: Option<DateTime<Utc>>,
}

impl RateLimitWindow {
    /// Creates a window.
    pub fn new(utilization: f64, resets_at: Option<DateTime<Utc>>) -> Self {
        Self {
            utilization,
            resets_at,
        }
    }

    /// Utilization clamped to 0-100.
    pub fn clamped_utilization(&self) -> f64 {
        if self.utilization.is_finite() {
            self.utilization.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// The rate-limit windows of a subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    /// 5-hour session window.
    pub five_hour: Option<RateLimitWindow>,
    /// 7-day window, all models.
    pub seven_day: Option<RateLimitWindow>,
    /// 7-day window for OAuth apps.
    pub seven_day_oauth_apps: Option<RateLimitWindow>,
    /// 7-day window for Opus.
    pub seven_day_opus: Option<RateLimitWindow>,
}

impl RateLimitState {
    /// Returns the present windows with display labels.
    pub fn labeled_windows(&self) -> Vec<(&'static str, &RateLimitWindow)> {
        [
            ("Session (5h)", self.five_hour.as_ref()),
            ("Weekly (7d)", self.seven_day.as_ref()),
            ("OAuth apps (7d)", self.seven_day_oauth_apps.as_ref()),
            ("Opus (7d)", self.seven_day_opus.as_ref()),
        ]
        .into_iter()
        .filter_map(|(label, window)| window.map(|w| (label, w)))
        .collect()
    }

    /// Highest utilization across windows.
    pub fn max_utilization(&self) -> f64 {
        self.labeled_windows()
            .iter()
            .map(|(_, w)| w.clamped_utilization())
            .fold(0.0, f64::max)
    }
}

/// Account details from the OAuth profile endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Account UUID.
    pub uuid: String,
    /// Full name.
    pub full_name: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Max subscription.
    pub has_claude_max: bool,
    /// Pro subscription.
    pub has_claude_pro: bool,
}

impl AccountInfo {
    /// Subscription plan label.
    pub fn plan_name(&self) -> &'static str {
        if self.has_claude_max {
            "Max"
        } else if self.has_claude_pro {
            "Pro"
        } else {
            "Free"
        }
    }
}

/// Organization details from the OAuth profile endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationInfo {
    /// Organization UUID.
    pub uuid: String,
    /// Organization name.
    pub name: String,
    /// Organization type.
    pub organization_type: Option<String>,
    /// Billing type.
    pub billing_type: Option<String>,
    /// Rate limit tier.
    pub rate_limit_tier: Option<String>,
}

/// Account plus optional organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    /// Account.
    pub account: AccountInfo,
    /// Organization.
    pub organization: Option<OrganizationInfo>,
}

/// Payload of the rate-limit monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSnapshot {
    /// Rate-limit windows.
    pub rate_limits: Option<RateLimitState>,
    /// Profile, when requested.
    pub profile: Option<ProfileData>,
}
