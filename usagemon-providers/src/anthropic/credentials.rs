//! Claude OAuth credential loading.
//!
//! The Claude CLI stores OAuth credentials in two places:
//!
//! 1. **File**: `~/.claude/.credentials.json`
//! 2. **System keychain**: service = `Claude Code-credentials`
//!
//! The file is read first so the keychain (which may prompt) is only
//! touched when the file is missing.
//!
//! # Credentials Format
//!
//! ```json
//! {
//!   "claudeAiOauth": {
//!     "accessToken": "sk-ant-oat01-...",
//!     "refreshToken": "...",
//!     "expiresAt": 1735000000000,
//!     "scopes": ["user:inference", "user:profile"]
//!   }
//! }
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use usagemon_core::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Keychain service name used by the Claude CLI.
pub const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

/// Prefix every OAuth access token carries.
pub const TOKEN_PREFIX: &str = "sk-ant-oat";

/// Tokens expiring within this window are treated as expired.
const EXPIRY_BUFFER_MINUTES: i64 = 5;

// ============================================================================
// Errors
// ============================================================================

/// Failure to obtain usable OAuth credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// Nothing found in any location.
    #[error("{0}")]
    NotFound(String),

    /// Credentials exist but cannot be used.
    #[error("{0}")]
    Invalid(String),

    /// Token is expired or about to expire.
    #[error("OAuth token has expired. Run 'claude' to refresh your authentication.")]
    Expired,
}

impl From<CredentialsError> for ApiError {
    fn from(err: CredentialsError) -> Self {
        match err {
            CredentialsError::NotFound(_) => ApiError::credentials_missing(err.to_string()),
            CredentialsError::Invalid(_) | CredentialsError::Expired => {
                ApiError::credentials_invalid(err.to_string())
            }
        }
    }
}

// ============================================================================
// Credentials File Structures
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    claude_ai_oauth: Option<RawOAuthData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOAuthData {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<RawExpiry>,
    scopes: Option<Vec<String>>,
}

/// The CLI has written expiry both as epoch milliseconds and as a timestamp.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExpiry {
    Epoch(i64),
    Text(String),
}

impl RawExpiry {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Epoch(ts) => {
                let millis = if *ts > 10_000_000_000 { *ts } else { ts * 1000 };
                Utc.timestamp_millis_opt(millis).single()
            }
            Self::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|| text.parse::<i64>().ok().and_then(|n| Self::Epoch(n).to_datetime())),
        }
    }
}

// ============================================================================
// OAuth Credentials
// ============================================================================

/// Where credentials were loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `~/.claude/.credentials.json`.
    File,
    /// System keychain.
    Keychain,
}

/// Validated OAuth credentials.
#[derive(Clone)]
pub struct OAuthCredentials {
    /// Access token.
    pub access_token: String,
    /// Refresh token, if present.
    pub refresh_token: Option<String>,
    /// Expiration time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// Where the credentials came from.
    pub source: CredentialSource,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Expiry details for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenExpiry {
    /// Expiration time, if known.
    pub expires_at: Option<DateTime<Utc>>,
    /// True once the expiration time has passed.
    pub is_expired: bool,
    /// Time left, while not expired.
    pub expires_in: Option<Duration>,
}

impl OAuthCredentials {
    /// Loads credentials from the file, then the keychain.
    #[instrument]
    pub fn load() -> Result<Self, CredentialsError> {
        let file_result = match credentials_file_path() {
            Some(path) => Self::load_from_path(&path),
            None => Err(CredentialsError::NotFound(
                "Could not determine home directory".to_string(),
            )),
        };

        match file_result {
            Ok(creds) => Ok(creds),
            Err(CredentialsError::NotFound(file_msg)) => {
                debug!("No credentials file, trying keychain");
                Self::load_from_keychain().map_err(|e| match e {
                    CredentialsError::NotFound(_) => CredentialsError::NotFound(file_msg),
                    other => other,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Loads credentials from a credentials file.
    pub fn load_from_path(path: &Path) -> Result<Self, CredentialsError> {
        if !path.exists() {
            return Err(CredentialsError::NotFound(format!(
                "Credentials file not found at {}. Run 'claude' to authenticate.",
                path.display()
            )));
        }

        debug!(path = %path.display(), "Reading credentials file");
        let content = fs::read_to_string(path).map_err(|e| {
            CredentialsError::Invalid(format!("Failed to read credentials file: {e}"))
        })?;

        Self::parse(&content, CredentialSource::File, Utc::now())
    }

    /// Loads credentials from the system keychain.
    pub fn load_from_keychain() -> Result<Self, CredentialsError> {
        // The CLI writes under the login name; older versions used an empty account.
        let user = std::env::var("USER").ok().filter(|u| !u.is_empty());

        for account in user.iter().map(String::as_str).chain(std::iter::once("")) {
            let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, account) else {
                continue;
            };
            match entry.get_password() {
                Ok(secret) => {
                    debug!("Found credentials in keychain");
                    return Self::parse(&secret, CredentialSource::Keychain, Utc::now());
                }
                Err(keyring::Error::NoEntry) => {}
                Err(e) => warn!(error = %e, "Keychain lookup failed"),
            }
        }

        Err(CredentialsError::NotFound(
            "No Claude OAuth credentials found. Run 'claude' to authenticate.".to_string(),
        ))
    }

    /// Parses and validates credentials JSON.
    pub fn parse(
        json: &str,
        source: CredentialSource,
        now: DateTime<Utc>,
    ) -> Result<Self, CredentialsError> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            CredentialsError::Invalid(format!("Failed to parse credentials file: {e}"))
        })?;

        let Some(raw) = file.claude_ai_oauth else {
            return Err(CredentialsError::NotFound(
                "No OAuth credentials found in credentials file. Run 'claude' to authenticate."
                    .to_string(),
            ));
        };

        let Some(access_token) = raw.access_token.filter(|t| !t.is_empty()) else {
            return Err(CredentialsError::Invalid(
                "No access token found in credentials file.".to_string(),
            ));
        };

        if !access_token.starts_with(TOKEN_PREFIX) {
            return Err(CredentialsError::Invalid(format!(
                "Invalid OAuth token format. Expected token starting with '{TOKEN_PREFIX}'."
            )));
        }

        let creds = Self {
            access_token,
            refresh_token: raw.refresh_token,
            expires_at: raw.expires_at.as_ref().and_then(RawExpiry::to_datetime),
            scopes: raw.scopes.unwrap_or_default(),
            source,
        };

        if creds.is_expired_at(now) {
            return Err(CredentialsError::Expired);
        }

        Ok(creds)
    }

    /// True if the token expires within the safety buffer of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at - Duration::minutes(EXPIRY_BUFFER_MINUTES) < now)
    }

    /// Expiry details relative to `now`.
    pub fn expiry_info(&self, now: DateTime<Utc>) -> TokenExpiry {
        let Some(expires_at) = self.expires_at else {
            return TokenExpiry {
                expires_at: None,
                is_expired: false,
                expires_in: None,
            };
        };
        let remaining = expires_at - now;
        let is_expired = remaining <= Duration::zero();
        TokenExpiry {
            expires_at: Some(expires_at),
            is_expired,
            expires_in: (!is_expired).then_some(remaining),
        }
    }
}

/// Returns the path to the Claude credentials file.
pub fn credentials_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".claude").join(".credentials.json"))
}

// ============================================================================
// Tests
// ============================================================================
