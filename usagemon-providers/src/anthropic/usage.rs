//! Anthropic per-period usage adapter.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use usagemon_core::{
    ApiError, CostInfo, ProviderCredentials, ProviderKind, TimePeriod, TokenUsage, UsageData,
    UsageProvider,
};
use usagemon_fetch::{HttpClient, build_url};

use super::admin::{ADMIN_API_BASE, admin_headers};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnthropicUsageResponse {
    total_input_tokens: u64,
    total_output_tokens: u64,
    total_cost: f64,
}

/// Usage adapter for `GET /v1/organizations/usage`.
#[derive(Debug, Clone)]
pub struct AnthropicUsageProvider {
    client: HttpClient,
    base_url: String,
}

impl AnthropicUsageProvider {
    /// Creates the adapter.
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: ADMIN_API_BASE.to_string(),
        }
    }

    /// Overrides the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl UsageProvider for AnthropicUsageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn is_configured(&self, credentials: &ProviderCredentials) -> bool {
        credentials.api_key().is_some()
    }

    #[instrument(skip(self, credentials))]
    async fn fetch_usage(
        &self,
        credentials: &ProviderCredentials,
        period: &TimePeriod,
    ) -> Result<UsageData, ApiError> {
        let tag = |e: ApiError| e.with_provider(self.kind());
        let key = credentials.api_key().ok_or_else(|| {
            tag(ApiError::credentials_missing("API key not configured").with_status(401))
        })?;

        let url = build_url(
            &self.base_url,
            "/organizations/usage",
            [("start_date", period.start_date()), ("end_date", period.end_date())],
        )
        .map_err(|e| tag(e.into()))?;
        debug!(url = %url, "Fetching Anthropic usage");

        let headers = admin_headers(key).map_err(tag)?;
        let raw: AnthropicUsageResponse = self
            .client
            .get_json(&url, headers)
            .await
            .map_err(|e| tag(e.into()))?;

        Ok(UsageData::new(
            self.kind(),
            TokenUsage::new(raw.total_input_tokens, raw.total_output_tokens),
            CostInfo::usd(raw.total_cost),
            *period,
        ))
    }
}
