//! OpenAI organization usage adapter.
//!
//! ```text
//! GET https://api.openai.com/v1/organization/usage?start_time=<unix>&end_time=<unix>
//! Authorization: Bearer <key>
//! OpenAI-Organization: <org id>   (optional)
//! ```
//!
//! The endpoint reports tokens only; cost is always zero.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use usagemon_core::{
    ApiError, CostInfo, ProviderCredentials, ProviderKind, TimePeriod, TokenUsage, UsageData,
    UsageProvider,
};
use usagemon_fetch::{HeaderMap, HeaderValue, HttpClient, build_url};

/// Base URL for the OpenAI API.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsageResponse {
    #[serde(default)]
    data: Vec<OpenAIUsageRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenAIUsageRow {
    n_context_tokens: u64,
    n_generated_tokens: u64,
}

impl OpenAIUsageResponse {
    fn totals(&self) -> TokenUsage {
        self.data.iter().fold(TokenUsage::default(), |mut acc, row| {
            acc += TokenUsage::new(row.n_context_tokens, row.n_generated_tokens);
            acc
        })
    }
}

/// Usage adapter for OpenAI.
#[derive(Debug, Clone)]
pub struct OpenAIUsageProvider {
    client: HttpClient,
    base_url: String,
}

impl OpenAIUsageProvider {
    /// Creates the adapter.
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: OPENAI_API_BASE.to_string(),
        }
    }

    /// Overrides the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn headers(key: &str, organization: Option<&str>) -> Result<HeaderMap, ApiError> {
        let invalid = |_| ApiError::credentials_invalid("Credentials contain invalid characters");
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?,
        );
        if let Some(org) = organization {
            headers.insert("openai-organization", HeaderValue::from_str(org).map_err(invalid)?);
        }
        Ok(headers)
    }
}

#[async_trait]
impl UsageProvider for OpenAIUsageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
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
            "/organization/usage",
            [
                ("start_time", period.start.timestamp().to_string()),
                ("end_time", period.end.timestamp().to_string()),
            ],
        )
        .map_err(|e| tag(e.into()))?;
        debug!(url = %url, "Fetching OpenAI usage");

        let headers = Self::headers(key, credentials.organization_id.as_deref()).map_err(tag)?;
        let raw: OpenAIUsageResponse = self
            .client
            .get_json(&url, headers)
            .await
            .map_err(|e| tag(e.into()))?;

        Ok(UsageData::new(
            self.kind(),
            raw.totals(),
            CostInfo::usd(0.0),
            *period,
        ))
    }
}
