//! Usage-related types.
//!
//! - [`TokenUsage`] - Input/output token counts
//! - [`CostInfo`] - Amount and currency
//! - [`TimePeriod`] - Half-open reporting range
//! - [`UsageData`] - Normalized per-provider usage
//! - [`UsageSummary`] - Month-to-date organization totals

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use super::provider::ProviderKind;
use crate::error::CoreError;

// ============================================================================
// Token Usage
// ============================================================================

/// Token counts for a period or model.
///
/// `total_tokens` is always `input_tokens + output_tokens`; construct through
/// [`TokenUsage::new`] to keep that true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens.
    pub input_tokens: u64,
    /// Completion tokens.
    pub output_tokens: u64,
    /// Sum of input and output.
    pub total_tokens: u64,
    /// Tokens served from the prompt cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
    /// Tokens written to the prompt cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write_tokens: Option<u64>,
}

impl TokenUsage {
    /// Creates token usage from input and output counts.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
            cache_read_tokens: None,
            cache_write_tokens: None,
        }
    }

    /// Checks the total invariant.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.total_tokens != self.input_tokens.saturating_add(self.output_tokens) {
            return Err(CoreError::InvalidData(format!(
                "total_tokens {} != input {} + output {}",
                self.total_tokens, self.input_tokens, self.output_tokens
            )));
        }
        Ok(())
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        *self = Self {
            cache_read_tokens: sum_opt(self.cache_read_tokens, rhs.cache_read_tokens),
            cache_write_tokens: sum_opt(self.cache_write_tokens, rhs.cache_write_tokens),
            ..Self::new(
                self.input_tokens.saturating_add(rhs.input_tokens),
                self.output_tokens.saturating_add(rhs.output_tokens),
            )
        };
    }
}

fn sum_opt(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
    }
}

// ============================================================================
// Cost
// ============================================================================

/// A monetary amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostInfo {
    /// Total cost.
    pub total_cost: f64,
    /// ISO currency code, e.g. `USD`.
    pub currency: String,
}

impl CostInfo {
    /// Creates a USD amount.
    pub fn usd(total_cost: f64) -> Self {
        Self {
            total_cost,
            currency: "USD".to_string(),
        }
    }
}

impl Default for CostInfo {
    fn default() -> Self {
        Self::usd(0.0)
    }
}

// ============================================================================
// Time Period
// ============================================================================

/// A reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimePeriod {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// End of the period.
    pub end: DateTime<Utc>,
}

impl TimePeriod {
    /// Creates a period.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The last `days` days ending at `now`, clamped to the earliest
    /// representable instant.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        let start = now
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::new(start, now)
    }

    /// From the first instant of the month containing `now` until `now`.
    pub fn month_to_date(now: DateTime<Utc>) -> Self {
        let start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(now);
        Self::new(start, now)
    }

    /// Start as `YYYY-MM-DD`.
    pub fn start_date(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// End as `YYYY-MM-DD`.
    pub fn end_date(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    /// Key fragment identifying this period, used in cache keys.
    pub fn cache_key(&self) -> String {
        format!("{}-{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

// ============================================================================
// Usage Data
// ============================================================================

/// Usage attributed to one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    /// Provider model identifier.
    pub model_id: String,
    /// Display name.
    pub model_name: String,
    /// Tokens used by this model.
    pub usage: TokenUsage,
    /// Cost for this model.
    pub cost: CostInfo,
    /// Number of requests.
    pub request_count: u64,
}

/// Normalized usage for one provider over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    /// Provider this data came from.
    pub provider: ProviderKind,
    /// Token totals.
    pub usage: TokenUsage,
    /// Cost totals.
    pub cost: CostInfo,
    /// Period covered.
    pub period: TimePeriod,
    /// Optional per-model breakdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_breakdown: Option<Vec<ModelUsage>>,
    /// When this data was fetched.
    pub last_updated: DateTime<Utc>,
}

impl UsageData {
    /// Creates usage data stamped with the current time.
    pub fn new(provider: ProviderKind, usage: TokenUsage, cost: CostInfo, period: TimePeriod) -> Self {
        Self {
            provider,
            usage,
            cost,
            period,
            model_breakdown: None,
            last_updated: Utc::now(),
        }
    }

    /// Attaches a per-model breakdown.
    #[must_use]
    pub fn with_model_breakdown(mut self, models: Vec<ModelUsage>) -> Self {
        self.model_breakdown = Some(models);
        self
    }
}

// ============================================================================
// Usage Summary
// ============================================================================

/// Organization-wide totals from the Admin cost report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    /// Total input tokens.
    pub total_input_tokens: u64,
    /// Total output tokens.
    pub total_output_tokens: u64,
    /// Total cost in USD.
    pub total_cost: f64,
    /// Start of the summarized period.
    pub period_start: DateTime<Utc>,
    /// End of the summarized period.
    pub period_end: DateTime<Utc>,
    /// When the summary was computed.
    pub last_updated: DateTime<Utc>,
}

impl UsageSummary {
    /// Total tokens.
    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens.saturating_add(self.total_output_tokens)
    }
}
