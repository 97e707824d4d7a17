//! OpenRouter key usage adapter.
//!
//! `GET /api/v1/auth/key` reports credit usage for the calling key. Credits
//! are reported as input tokens and approximated as USD at 1000 credits per
//! dollar.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use usagemon_core::{
    ApiError, CostInfo, ProviderCredentials, ProviderKind, TimePeriod, TokenUsage, UsageData,
    UsageProvider,
};
use usagemon_fetch::{HeaderMap, HeaderValue, HttpClient, build_url};

/// Base URL for the OpenRouter API.
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

const CREDITS_PER_USD: f64 = 1000.0;

#[derive(Debug, Default, Deserialize)]
struct OpenRouterKeyResponse {
    #[serde(default)]
    data: OpenRouterKeyData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenRouterKeyData {
    usage: f64,
    limit: Option<f64>,
    is_free_tier: bool,
}

/// Usage adapter for OpenRouter.
#[derive(Debug, Clone)]
pub struct OpenRouterUsageProvider {
    client: HttpClient,
    base_url: String,
}

impl OpenRouterUsageProvider {
    /// Creates the adapter.
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: OPENROUTER_API_BASE.to_string(),
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
impl UsageProvider for OpenRouterUsageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
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

        let url = build_url(&self.base_url, "/auth/key", []).map_err(|e| tag(e.into()))?;
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| tag(ApiError::credentials_invalid("API key contains invalid characters")))?,
        );

        let raw: OpenRouterKeyResponse = self
            .client
            .get_json(&url, headers)
            .await
            .map_err(|e| tag(e.into()))?;
        debug!(
            usage = raw.data.usage,
            limit = ?raw.data.limit,
            free_tier = raw.data.is_free_tier,
            "OpenRouter key usage"
        );

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let credits = raw.data.usage.max(0.0).round() as u64;

        Ok(UsageData::new(
            self.kind(),
            TokenUsage::new(credits, 0),
            CostInfo::usd(raw.data.usage / CREDITS_PER_USD),
            *period,
        ))
    }
}
