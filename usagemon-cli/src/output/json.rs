//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::path::Path;
use usagemon_core::{RateLimitSnapshot, UsageData, UsageSummary};
use usagemon_store::{
    AttemptOutcome, ConfigSource, LoadConfigResult, MonitorState, ResolvedConfig, SourceAttempt,
};

// ============================================================================
// Output Types
// ============================================================================

/// One monitor's state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorOutput<'a, T: Serialize> {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_datetime_opt")]
    pub last_fetch: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    pub data: Option<&'a T>,
}

impl<'a, T: Serialize> MonitorOutput<'a, T> {
    fn from_state(state: &'a MonitorState<T>) -> Self {
        Self {
            running: state.is_running,
            last_fetch: state.last_fetch,
            error: state.last_error.as_deref(),
            error_kind: state.last_error_kind.map(|k| k.as_str()),
            data: state.payload.as_ref(),
        }
    }
}

/// Dashboard snapshot (`watch --once --format json`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limits: Option<MonitorOutput<'a, RateLimitSnapshot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_usage: Option<MonitorOutput<'a, UsageSummary>>,
}

/// A provider that produced no data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedOutput {
    pub provider: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

/// Usage report (`usage --format json`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReportOutput<'a> {
    pub providers: &'a [UsageData],
    pub skipped: Vec<SkippedOutput>,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub currency: &'static str,
}

/// Resolved configuration (`config --format json`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOutput<'a> {
    pub source: ConfigSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'a Path>,
    pub warnings: &'a [String],
    pub config: ResolvedConfig,
}

// ============================================================================
// Serialization helpers
// ============================================================================

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the dashboard monitors.
    pub fn format_dashboard(
        &self,
        rate_limits: Option<&MonitorState<RateLimitSnapshot>>,
        api_usage: Option<&MonitorState<UsageSummary>>,
    ) -> Result<String> {
        self.format(&DashboardOutput {
            rate_limits: rate_limits.map(MonitorOutput::from_state),
            api_usage: api_usage.map(MonitorOutput::from_state),
        })
    }

    /// Formats the usage report.
    pub fn format_usage_report(
        &self,
        usage: &[UsageData],
        attempts: &[SourceAttempt],
        currency: &'static str,
    ) -> Result<String> {
        let skipped = attempts
            .iter()
            .filter_map(|attempt| {
                let (reason, kind) = match &attempt.outcome {
                    AttemptOutcome::Cached | AttemptOutcome::Fetched => return None,
                    AttemptOutcome::SkippedFilter => ("filtered".to_string(), None),
                    AttemptOutcome::SkippedDisabled => ("disabled".to_string(), None),
                    AttemptOutcome::SkippedUnconfigured => ("not configured".to_string(), None),
                    AttemptOutcome::Failed(e) => (e.message.clone(), Some(e.kind.as_str())),
                };
                Some(SkippedOutput {
                    provider: attempt.provider.cli_name(),
                    reason,
                    error_kind: kind,
                })
            })
            .collect();

        self.format(&UsageReportOutput {
            providers: usage,
            skipped,
            total_tokens: usage.iter().map(|d| d.usage.total_tokens).sum(),
            total_cost: usage.iter().map(|d| d.cost.total_cost).sum(),
            currency,
        })
    }

    /// Formats the loaded configuration with secrets masked.
    pub fn format_config(&self, loaded: &LoadConfigResult) -> Result<String> {
        self.format(&ConfigOutput {
            source: loaded.source,
            path: loaded.path.as_deref(),
            warnings: &loaded.warnings,
            config: loaded.config.redacted(),
        })
    }
}
