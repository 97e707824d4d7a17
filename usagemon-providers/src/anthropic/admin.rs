//! Anthropic Admin API client.
//!
//! Organization-level cost and Claude Code usage reports. Requires an admin
//! key (`sk-ant-admin...`).
//!
//! ```text
//! GET https://api.anthropic.com/v1/organizations/cost_report
//! GET https://api.anthropic.com/v1/organizations/usage_report/claude_code
//! x-api-key: <admin key>
//! anthropic-version: 2023-06-01
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use usagemon_core::{ApiError, TimePeriod, UsageSummary};
use usagemon_fetch::{HeaderMap, HeaderValue, HttpClient, build_url};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the Admin API.
pub const ADMIN_API_BASE: &str = "https://api.anthropic.com/v1";

/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ============================================================================
// Request Parameters
// ============================================================================

/// Grouping dimensions for the cost report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostGroupBy {
    /// Group by workspace.
    WorkspaceId,
    /// Group by cost description.
    Description,
}

impl CostGroupBy {
    fn as_str(self) -> &'static str {
        match self {
            Self::WorkspaceId => "workspace_id",
            Self::Description => "description",
        }
    }
}

/// Parameters for [`AnthropicAdminApi::cost_report`].
#[derive(Debug, Clone)]
pub struct CostReportParams {
    /// Report start.
    pub starting_at: DateTime<Utc>,
    /// Report end.
    pub ending_at: Option<DateTime<Utc>>,
    /// Bucket width; the API only supports `1d`.
    pub daily_buckets: bool,
    /// Grouping.
    pub group_by: Vec<CostGroupBy>,
    /// Max buckets per page.
    pub limit: Option<u32>,
}

impl CostReportParams {
    /// Daily buckets over `period`.
    pub fn daily(period: &TimePeriod) -> Self {
        Self {
            starting_at: period.start,
            ending_at: Some(period.end),
            daily_buckets: true,
            group_by: Vec::new(),
            limit: None,
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("starting_at", iso(self.starting_at))];
        if let Some(end) = self.ending_at {
            query.push(("ending_at", iso(end)));
        }
        if self.daily_buckets {
            query.push(("bucket_width", "1d".to_string()));
        }
        if !self.group_by.is_empty() {
            let joined: Vec<&str> = self.group_by.iter().map(|g| g.as_str()).collect();
            query.push(("group_by", joined.join(",")));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

/// Parameters for [`AnthropicAdminApi::claude_code_usage`].
#[derive(Debug, Clone)]
pub struct ClaudeCodeUsageParams {
    /// First day to include.
    pub starting_at: DateTime<Utc>,
    /// Max records per page.
    pub limit: Option<u32>,
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Response Types
// ============================================================================

/// One line item of a cost bucket.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CostResultItem {
    /// Workspace, when grouped by workspace.
    #[serde(default)]
    pub workspace_id: Option<String>,
    /// Description, when grouped by description.
    #[serde(default)]
    pub description: Option<String>,
    /// Input tokens.
    #[serde(default)]
    pub input_tokens: u64,
    /// Output tokens.
    #[serde(default)]
    pub output_tokens: u64,
    /// Cache creation tokens.
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    /// Cache read tokens.
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    /// Cost in USD.
    #[serde(default)]
    pub cost: f64,
}

/// One time bucket of the cost report.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CostBucket {
    /// Bucket start.
    pub starting_at: String,
    /// Bucket end.
    pub ending_at: String,
    /// Line items.
    #[serde(default)]
    pub results: Vec<CostResultItem>,
}

/// Cost report page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CostReport {
    /// Buckets.
    #[serde(rename = "data")]
    pub buckets: Vec<CostBucket>,
    /// More pages available.
    #[serde(default)]
    pub has_more: bool,
    /// Cursor for the next page.
    #[serde(default)]
    pub next_page: Option<String>,
}

impl CostReport {
    /// Sums every line item into a summary over `period`.
    pub fn summarize(&self, period: &TimePeriod, now: DateTime<Utc>) -> UsageSummary {
        let items = self.buckets.iter().flat_map(|b| b.results.iter());
        let (input, output, cost) = items.fold((0u64, 0u64, 0.0f64), |(i, o, c), item| {
            (
                i.saturating_add(item.input_tokens),
                o.saturating_add(item.output_tokens),
                c + item.cost,
            )
        });
        UsageSummary {
            total_input_tokens: input,
            total_output_tokens: output,
            total_cost: cost,
            period_start: period.start,
            period_end: period.end,
            last_updated: now,
        }
    }
}

/// Who generated Claude Code usage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeCodeActor {
    /// A signed-in user.
    UserActor {
        /// User email.
        email_address: String,
    },
    /// An API key.
    ApiKeyActor {
        /// Key name.
        api_key_name: String,
    },
}

impl ClaudeCodeActor {
    /// Email or key name.
    pub fn label(&self) -> &str {
        match self {
            Self::UserActor { email_address } => email_address,
            Self::ApiKeyActor { api_key_name } => api_key_name,
        }
    }
}

/// Core Claude Code metrics for one actor-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClaudeCodeMetrics {
    /// Sessions.
    pub total_sessions: u64,
    /// Conversations.
    pub total_conversations: u64,
    /// Tokens.
    pub total_tokens_used: u64,
    /// Input tokens.
    pub input_tokens: u64,
    /// Output tokens.
    pub output_tokens: u64,
}

/// One Claude Code usage record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClaudeCodeUsageRecord {
    /// Actor.
    pub actor: ClaudeCodeActor,
    /// Metrics.
    pub core_metrics: ClaudeCodeMetrics,
    /// Customer type.
    #[serde(default)]
    pub customer_type: String,
    /// Day (`YYYY-MM-DD`).
    pub date: String,
}

/// Claude Code usage page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClaudeCodeUsageReport {
    /// Records.
    #[serde(rename = "data")]
    pub records: Vec<ClaudeCodeUsageRecord>,
    /// More pages available.
    #[serde(default)]
    pub has_more: bool,
    /// Cursor for the next page.
    #[serde(default)]
    pub next_page: Option<String>,
}

// ============================================================================
// API Client
// ============================================================================

/// Anthropic Admin API client.
#[derive(Clone)]
pub struct AnthropicAdminApi {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for AnthropicAdminApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicAdminApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicAdminApi {
    /// Creates a client for an admin key.
    pub fn new(client: HttpClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: ADMIN_API_BASE.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Overrides the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        admin_headers(&self.api_key)
    }

    /// Fetches one page of the cost report.
    #[instrument(skip(self, params))]
    pub async fn cost_report(&self, params: &CostReportParams) -> Result<CostReport, ApiError> {
        let url = build_url(&self.base_url, "/organizations/cost_report", params.query())?;
        debug!(url = %url, "Fetching cost report");
        Ok(self.client.get_json(&url, self.headers()?).await?)
    }

    /// Fetches one page of Claude Code usage.
    #[instrument(skip(self, params))]
    pub async fn claude_code_usage(
        &self,
        params: &ClaudeCodeUsageParams,
    ) -> Result<ClaudeCodeUsageReport, ApiError> {
        let mut query = vec![(
            "starting_at",
            params.starting_at.format("%Y-%m-%d").to_string(),
        )];
        if let Some(limit) = params.limit {
            query.push(("limit", limit.to_string()));
        }
        let url = build_url(&self.base_url, "/organizations/usage_report/claude_code", query)?;
        debug!(url = %url, "Fetching Claude Code usage");
        Ok(self.client.get_json(&url, self.headers()?).await?)
    }

    /// Month-to-date totals from daily cost buckets.
    pub async fn monthly_usage_summary(&self, now: DateTime<Utc>) -> Result<UsageSummary, ApiError> {
        let period = TimePeriod::month_to_date(now);
        let report = self.cost_report(&CostReportParams::daily(&period)).await?;
        Ok(report.summarize(&period, now))
    }
}

/// `x-api-key` plus `anthropic-version` headers.
pub(crate) fn admin_headers(api_key: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let key = HeaderValue::from_str(api_key)
        .map_err(|_| ApiError::credentials_invalid("API key contains invalid characters"))?;
    headers.insert("x-api-key", key);
    headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
    Ok(headers)
}

// ============================================================================
// Tests
// ============================================================================
