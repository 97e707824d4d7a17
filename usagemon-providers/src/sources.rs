//! Poll sources backing the dashboard monitors.
//!
//! - [`CostReportSource`] - month-to-date Admin API cost summary
//! - [`RateLimitSource`] - subscription rate limits (plus profile)

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use usagemon_core::{ApiError, PollSource, ProfileData, RateLimitSnapshot, UsageSummary};
use usagemon_fetch::HttpClient;

use crate::anthropic::{AnthropicAdminApi, ClaudeOAuthApi, OAuthCredentials};

// ============================================================================
// Cost Report Source
// ============================================================================

/// Month-to-date organization cost from the Admin API.
#[derive(Debug, Clone)]
pub struct CostReportSource {
    client: HttpClient,
    admin_api_key: Option<String>,
    base_url: Option<String>,
}

impl CostReportSource {
    /// Creates the source; a missing key makes every poll fail with
    /// `credentials_missing`.
    pub fn new(client: HttpClient, admin_api_key: Option<String>) -> Self {
        Self {
            client,
            admin_api_key: admin_api_key.filter(|k| !k.trim().is_empty()),
            base_url: None,
        }
    }

    /// Overrides the Admin API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

#[async_trait]
impl PollSource for CostReportSource {
    type Output = UsageSummary;

    fn name(&self) -> &str {
        "cost-report"
    }

    async fn poll(&self) -> Result<UsageSummary, ApiError> {
        let Some(key) = self.admin_api_key.as_deref() else {
            return Err(ApiError::credentials_missing("No API key configured"));
        };
        let mut api = AnthropicAdminApi::new(self.client.clone(), key);
        if let Some(base) = &self.base_url {
            api = api.with_base_url(base.clone());
        }
        api.monthly_usage_summary(Utc::now()).await
    }
}

// ============================================================================
// Rate Limit Source
// ============================================================================

/// Subscription rate limits from the OAuth API.
///
/// Credentials are re-read on every poll so a `claude` re-login is picked up
/// without restarting. The profile is fetched with the first successful poll
/// and reused afterwards; later polls only call `/usage`.
#[derive(Debug, Clone)]
pub struct RateLimitSource {
    client: HttpClient,
    show_profile: bool,
    credentials_path: Option<PathBuf>,
    base_url: Option<String>,
    profile: Arc<Mutex<Option<ProfileData>>>,
}

impl RateLimitSource {
    /// Creates the source.
    pub fn new(client: HttpClient, show_profile: bool) -> Self {
        Self {
            client,
            show_profile,
            credentials_path: None,
            base_url: None,
            profile: Arc::new(Mutex::new(None)),
        }
    }

    /// Reads credentials only from this file.
    #[must_use]
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    /// Overrides the OAuth API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    async fn load_credentials(&self) -> Result<OAuthCredentials, ApiError> {
        let path = self.credentials_path.clone();
        let loaded = tokio::task::spawn_blocking(move || match path {
            Some(path) => OAuthCredentials::load_from_path(&path),
            None => OAuthCredentials::load(),
        })
        .await
        .map_err(|e| ApiError::credentials_invalid(format!("Credential loading failed: {e}")))?;
        Ok(loaded?)
    }

    fn cached_profile(&self) -> Option<ProfileData> {
        self.profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PollSource for RateLimitSource {
    type Output = RateLimitSnapshot;

    fn name(&self) -> &str {
        "rate-limits"
    }

    async fn poll(&self) -> Result<RateLimitSnapshot, ApiError> {
        let credentials = self.load_credentials().await?;
        debug!(source = ?credentials.source, "Using OAuth credentials");

        let mut api = ClaudeOAuthApi::new(self.client.clone(), credentials);
        if let Some(base) = &self.base_url {
            api = api.with_base_url(base.clone());
        }

        if !self.show_profile {
            return Ok(RateLimitSnapshot {
                rate_limits: Some(api.usage().await?),
                profile: None,
            });
        }

        if let Some(profile) = self.cached_profile() {
            return Ok(RateLimitSnapshot {
                rate_limits: Some(api.usage().await?),
                profile: Some(profile),
            });
        }

        let (limits, profile) = api.rate_limit_summary().await?;
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = Some(profile.clone());
        Ok(RateLimitSnapshot {
            rate_limits: Some(limits),
            profile: Some(profile),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use usagemon_core::ApiErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_cost_source_without_key() {
        let source = CostReportSource::new(HttpClient::new(), Some("  ".into()));
        let err = source.poll().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::CredentialsMissing);
        assert_eq!(err.message, "No API key configured");
    }

    #[tokio::test]
    async fn test_rate_limit_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = RateLimitSource::new(HttpClient::new(), true)
            .with_credentials_path(dir.path().join("missing.json"));
        let err = source.poll().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::CredentialsMissing);
    }

    #[tokio::test]
    async fn test_rate_limit_source_without_profile() {
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join(".credentials.json");
        std::fs::write(
            &creds,
            r#"{"claudeAiOauth": {"accessToken": "sk-ant-oat01-abc", "expiresAt": null}}"#,
        )
        .unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/usage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "five_hour": {"utilization": 12.0, "resets_at": "2025-01-01T12:00:00Z"}
            })))
            .mount(&server)
            .await;

        let source = RateLimitSource::new(HttpClient::new(), false)
            .with_credentials_path(&creds)
            .with_base_url(server.uri());
        let snapshot = source.poll().await.unwrap();
        assert!(snapshot.profile.is_none());
        let limits = snapshot.rate_limits.unwrap();
        assert!((limits.five_hour.unwrap().utilization - 12.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_profile_fetched_once() {
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join(".credentials.json");
        std::fs::write(
            &creds,
            r#"{"claudeAiOauth": {"accessToken": "sk-ant-oat01-abc", "expiresAt": null}}"#,
        )
        .unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/usage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "five_hour": {"utilization": 40.0, "resets_at": null}
            })))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "account": {"uuid": "a1", "email": "ada@example.com",
                            "has_claude_max": false, "has_claude_pro": true},
                "organization": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = RateLimitSource::new(HttpClient::new(), true)
            .with_credentials_path(&creds)
            .with_base_url(server.uri());
        for _ in 0..3 {
            let snapshot = source.poll().await.unwrap();
            let profile = snapshot.profile.unwrap();
            assert_eq!(profile.account.email.as_deref(), Some("ada@example.com"));
            assert!(snapshot.rate_limits.is_some());
        }
        server.verify().await;
    }
}
