//! HTTP client with tracing.
//!
//! Wraps `reqwest` with request/response tracing and a JSON GET that turns
//! error statuses into [`FetchError::Status`] with the message extracted
//! from the body.

use reqwest::{Client, Response, header::HeaderMap};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{FetchError, HttpError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for usagemon.
const USER_AGENT: &str = concat!("usagemon/", env!("CARGO_PKG_VERSION"));

/// Longest raw body excerpt carried into an error message.
const MAX_ERROR_BODY: usize = 200;

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper shared by every source adapter.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// Falls back to reqwest's default client if the configured builder
    /// cannot be constructed.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self { inner: client }
    }

    /// Performs a GET request with custom headers.
    #[instrument(skip(self, headers), fields(url = %url))]
    async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<Response, HttpError> {
        debug!("GET request with headers");

        let response = self.inner.get(url).headers(headers).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request and decodes a JSON body.
    ///
    /// Non-success statuses become [`FetchError::Status`] carrying the
    /// message extracted from the error body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T, FetchError> {
        let response = self.get_with_headers(url, headers).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(status.as_u16(), &body);
            debug!(status = status.as_u16(), message = %message, "Request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(HttpError::from)?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Joins `base` and `path` and appends query parameters.
pub fn build_url<'a, I>(base: &str, path: &str, params: I) -> Result<String, HttpError>
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    let mut url = Url::parse(&joined).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, &value);
        }
    }
    let mut out = url.to_string();
    if out.ends_with('?') {
        out.pop();
    }
    Ok(out)
}

/// Pulls a human-readable message out of an error response body.
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}` and
/// `{"message": ..}`; otherwise falls back to `HTTP <status>` plus a body
/// excerpt.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidate = value
            .pointer("/error/message")
            .or_else(|| value.get("error").filter(|v| v.is_string()))
            .or_else(|| value.get("message"))
            .and_then(serde_json::Value::as_str);
        if let Some(message) = candidate {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        let excerpt: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
        format!("HTTP {status}: {excerpt}")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_json_any_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ping"))
            .and(header("x-api-key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "k".parse().unwrap());
        let url = build_url(&server.uri(), "v1/ping", []).unwrap();
        let body: serde_json::Value = HttpClient::new().get_json(&url, headers).await.unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_get_json_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_string(r#"{"error":{"message":"slow down"}}"#),
            )
            .mount(&server)
            .await;

        let err = HttpClient::new()
            .get_json::<serde_json::Value>(&server.uri(), HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), "slow down");
    }

    #[test]
    fn test_build_url_with_params() {
        let url = build_url(
            "https://api.anthropic.com/v1/",
            "/organizations/usage",
            [("start_date", "2025-01-01".to_string()), ("end_date", "2025-01-31".to_string())],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://api.anthropic.com/v1/organizations/usage?start_date=2025-01-01&end_date=2025-01-31"
        );

        let bare = build_url("https://openrouter.ai/api/v1", "auth/key", []).unwrap();
        assert_eq!(bare, "https://openrouter.ai/api/v1/auth/key");
    }

    #[test]
    fn test_extract_error_message_shapes() {
        assert_eq!(
            extract_error_message(401, r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#),
            "invalid x-api-key"
        );
        assert_eq!(extract_error_message(400, r#"{"error":"bad request"}"#), "bad request");
        assert_eq!(extract_error_message(404, r#"{"message":"no such org"}"#), "no such org");
        assert_eq!(extract_error_message(502, ""), "HTTP 502");
        assert_eq!(extract_error_message(500, "upstream exploded"), "HTTP 500: upstream exploded");
    }
}
