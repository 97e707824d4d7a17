//! Claude subscription rate-limit API.
//!
//! # Endpoints
//!
//! ```text
//! GET https://api.anthropic.com/api/oauth/usage
//! GET https://api.anthropic.com/api/oauth/profile
//! Authorization: Bearer <access_token>
//! anthropic-beta: oauth-2025-04-20
//! ```
//!
//! # Usage Response
//!
//! ```json
//! {
//!   "five_hour": {"utilization": 25.0, "resets_at": "2025-01-01T12:00:00Z"},
//!   "seven_day": {"utilization": 45.0, "resets_at": "2025-01-05T00:00:00Z"},
//!   "seven_day_oauth_apps": null,
//!   "seven_day_opus": {"utilization": 10.0, "resets_at": "2025-01-05T00:00:00Z"}
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};
use usagemon_core::{
    AccountInfo, ApiError, OrganizationInfo, ProfileData, RateLimitState, RateLimitWindow,
};
use usagemon_fetch::{HeaderMap, HeaderValue, HttpClient, build_url};

use super::credentials::OAuthCredentials;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the OAuth API.
pub const OAUTH_API_BASE: &str = "https://api.anthropic.com/api/oauth";

/// Beta header value the OAuth endpoints require.
pub const ANTHROPIC_BETA: &str = "oauth-2025-04-20";

// ============================================================================
// Raw Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawWindow {
    utilization: f64,
    resets_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUsageResponse {
    five_hour: Option<RawWindow>,
    seven_day: Option<RawWindow>,
    seven_day_oauth_apps: Option<RawWindow>,
    seven_day_opus: Option<RawWindow>,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    uuid: String,
    full_name: Option<String>,
    display_name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    has_claude_max: bool,
    #[serde(default)]
    has_claude_pro: bool,
}

#[derive(Debug, Deserialize)]
struct RawOrganization {
    uuid: String,
    name: String,
    organization_type: Option<String>,
    billing_type: Option<String>,
    rate_limit_tier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawProfileResponse {
    account: RawAccount,
    organization: Option<RawOrganization>,
}

fn to_window(raw: Option<RawWindow>) -> Option<RateLimitWindow> {
    raw.map(|w| {
        let resets_at = w.resets_at.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        });
        RateLimitWindow::new(w.utilization, resets_at)
    })
}

impl From<RawUsageResponse> for RateLimitState {
    fn from(raw: RawUsageResponse) -> Self {
        Self {
            five_hour: to_window(raw.five_hour),
            seven_day: to_window(raw.seven_day),
            seven_day_oauth_apps: to_window(raw.seven_day_oauth_apps),
            seven_day_opus: to_window(raw.seven_day_opus),
        }
    }
}

impl From<RawProfileResponse> for ProfileData {
    fn from(raw: RawProfileResponse) -> Self {
        Self {
            account: AccountInfo {
                uuid: raw.account.uuid,
                full_name: raw.account.full_name,
                display_name: raw.account.display_name,
                email: raw.account.email,
                has_claude_max: raw.account.has_claude_max,
                has_claude_pro: raw.account.has_claude_pro,
            },
            organization: raw.organization.map(|org| OrganizationInfo {
                uuid: org.uuid,
                name: org.name,
                organization_type: org.organization_type,
                billing_type: org.billing_type,
                rate_limit_tier: org.rate_limit_tier,
            }),
        }
    }
}

// ============================================================================
// API Client
// ============================================================================

/// Client for the Claude OAuth usage/profile endpoints.
#[derive(Debug, Clone)]
pub struct ClaudeOAuthApi {
    client: HttpClient,
    base_url: String,
    credentials: OAuthCredentials,
}

impl ClaudeOAuthApi {
    /// Creates a client for the given credentials.
    pub fn new(client: HttpClient, credentials: OAuthCredentials) -> Self {
        Self {
            client,
            base_url: OAUTH_API_BASE.to_string(),
            credentials,
        }
    }

    /// Overrides the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.credentials.access_token))
            .map_err(|_| ApiError::credentials_invalid("OAuth token contains invalid characters"))?;
        headers.insert("authorization", bearer);
        headers.insert("anthropic-beta", HeaderValue::from_static(ANTHROPIC_BETA));
        Ok(headers)
    }

    /// Fetches the current rate-limit windows.
    #[instrument(skip(self))]
    pub async fn usage(&self) -> Result<RateLimitState, ApiError> {
        let url = build_url(&self.base_url, "/usage", [])?;
        debug!(url = %url, "Fetching rate limits");
        let raw: RawUsageResponse = self.client.get_json(&url, self.headers()?).await?;
        Ok(raw.into())
    }

    /// Fetches the account profile.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<ProfileData, ApiError> {
        let url = build_url(&self.base_url, "/profile", [])?;
        debug!(url = %url, "Fetching profile");
        let raw: RawProfileResponse = self.client.get_json(&url, self.headers()?).await?;
        Ok(raw.into())
    }

    /// Fetches usage and profile concurrently; the first failure wins.
    pub async fn rate_limit_summary(&self) -> Result<(RateLimitState, ProfileData), ApiError> {
        futures::try_join!(self.usage(), self.profile())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anthropic::credentials::CredentialSource;
    use usagemon_core::ApiErrorKind;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> OAuthCredentials {
        OAuthCredentials {
            access_token: "sk-ant-oat01-test".into(),
            refresh_token: None,
            expires_at: None,
            scopes: vec![],
            source: CredentialSource::File,
        }
    }

    #[test]
    fn test_usage_transform() {
        let raw: RawUsageResponse = serde_json::from_str(
            r#"{
                "five_hour": {"utilization": 25.5, "resets_at": "2025-01-01T12:00:00Z"},
                "seven_day": {"utilization": 45.0, "resets_at": null},
                "seven_day_oauth_apps": null,
                "seven_day_opus": {"utilization": 10.0, "resets_at": "2025-01-05T00:00:00+00:00"}
            }"#,
        )
        .unwrap();
        let state = RateLimitState::from(raw);

        let five = state.five_hour.unwrap();
        assert!((five.utilization - 25.5).abs() < f64::EPSILON);
        assert!(five.resets_at.is_some());
        assert!(state.seven_day.unwrap().resets_at.is_none());
        assert!(state.seven_day_oauth_apps.is_none());
        assert!(state.seven_day_opus.is_some());
    }

    #[test]
    fn test_profile_transform_without_org() {
        let raw: RawProfileResponse = serde_json::from_str(
            r#"{"account": {"uuid": "a1", "full_name": "Ada L", "display_name": "ada",
                "email": "ada@example.com", "has_claude_max": true, "has_claude_pro": false},
                "organization": null}"#,
        )
        .unwrap();
        let profile = ProfileData::from(raw);
        assert_eq!(profile.account.email.as_deref(), Some("ada@example.com"));
        assert_eq!(profile.account.plan_name(), "Max");
        assert!(profile.organization.is_none());
    }

    #[tokio::test]
    async fn test_usage_request_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/usage"))
            .and(header("authorization", "Bearer sk-ant-oat01-test"))
            .and(header("anthropic-beta", ANTHROPIC_BETA))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "five_hour": {"utilization": 80.0, "resets_at": "2025-01-01T12:00:00Z"},
                "seven_day": null,
                "seven_day_oauth_apps": null,
                "seven_day_opus": null
            })))
            .mount(&server)
            .await;

        let api = ClaudeOAuthApi::new(HttpClient::new(), creds()).with_base_url(server.uri());
        let state = api.usage().await.unwrap();
        assert!((state.five_hour.unwrap().utilization - 80.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_summary_fails_when_profile_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/usage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token revoked"))
            .mount(&server)
            .await;

        let api = ClaudeOAuthApi::new(HttpClient::new(), creds()).with_base_url(server.uri());
        let err = api.rate_limit_summary().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Authentication);
        assert_eq!(err.status_code, Some(401));
    }
}
