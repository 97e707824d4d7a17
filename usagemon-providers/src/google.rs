//! Google usage adapter.
//!
//! Google exposes spend only through the Cloud Billing API, which needs a
//! service account. Until that is wired up every configured fetch fails
//! with status 501.

use async_trait::async_trait;
use usagemon_core::{
    ApiError, ProviderCredentials, ProviderKind, TimePeriod, UsageData, UsageProvider,
};

/// Usage adapter for Google.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleUsageProvider;

#[async_trait]
impl UsageProvider for GoogleUsageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn is_configured(&self, credentials: &ProviderCredentials) -> bool {
        credentials.api_key().is_some() || credentials.project_id.is_some()
    }

    async fn fetch_usage(
        &self,
        credentials: &ProviderCredentials,
        _period: &TimePeriod,
    ) -> Result<UsageData, ApiError> {
        if !self.is_configured(credentials) {
            return Err(
                ApiError::credentials_missing("API key or project ID not configured")
                    .with_status(401)
                    .with_provider(self.kind()),
            );
        }

        // TODO: query the Cloud Billing API once service-account credentials are supported.
        Err(ApiError::from_status(
            501,
            "Google Cloud Billing API not yet implemented - requires OAuth2 service account credentials",
        )
        .with_provider(self.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use usagemon_core::ApiErrorKind;

    #[tokio::test]
    async fn test_project_id_counts_as_configured() {
        let provider = GoogleUsageProvider;
        let creds = ProviderCredentials {
            project_id: Some("my-project".into()),
            ..ProviderCredentials::default()
        };
        assert!(provider.is_configured(&creds));

        let err = provider
            .fetch_usage(&creds, &TimePeriod::last_days(Utc::now(), 7))
            .await
            .unwrap_err();
        assert_eq!(err.status_code, Some(501));
        assert_eq!(err.kind, ApiErrorKind::Api);
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let err = GoogleUsageProvider
            .fetch_usage(&ProviderCredentials::default(), &TimePeriod::last_days(Utc::now(), 7))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::CredentialsMissing);
    }
}
