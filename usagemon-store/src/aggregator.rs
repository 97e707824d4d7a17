//! Multi-provider usage aggregation.
//!
//! [`UsageAggregator::fetch_all`] walks every provider in configuration order.
//! A provider excluded by the filter is skipped; otherwise a fresh cache entry
//! is served, and the adapter is called only on a miss.
//! Failures and skips never abort the walk; an empty result is valid.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use usagemon_core::{
    ApiError, ProviderCredentials, ProviderKind, TimePeriod, UsageData, UsageProvider,
};

use crate::cache::TtlCache;
use crate::config::ProviderSourceConfig;

/// TTL of aggregated results.
pub const AGGREGATOR_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

type EnvCredentialsFn = Arc<dyn Fn(ProviderKind) -> ProviderCredentials + Send + Sync>;

/// What happened to one provider during a refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Served from cache.
    Cached,
    /// Excluded by the provider filter.
    SkippedFilter,
    /// Explicitly disabled in configuration.
    SkippedDisabled,
    /// No usable credentials.
    SkippedUnconfigured,
    /// Fetched from the provider.
    Fetched,
    /// The adapter failed.
    Failed(ApiError),
}

/// One provider's outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAttempt {
    /// Provider.
    pub provider: ProviderKind,
    /// Outcome.
    pub outcome: AttemptOutcome,
}

/// Fans one refresh out over every configured provider.
pub struct UsageAggregator {
    providers: Vec<Box<dyn UsageProvider>>,
    explicit: Vec<ProviderSourceConfig>,
    env_credentials: EnvCredentialsFn,
    cache: TtlCache<UsageData>,
    timeout: Duration,
}

impl UsageAggregator {
    /// Creates an aggregator over `providers`, in the given order.
    pub fn new(providers: Vec<Box<dyn UsageProvider>>) -> Self {
        Self {
            providers,
            explicit: Vec::new(),
            env_credentials: Arc::new(|_| ProviderCredentials::default()),
            cache: TtlCache::new(AGGREGATOR_CACHE_TTL),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the explicit per-provider configuration.
    #[must_use]
    pub fn with_provider_config(mut self, explicit: Vec<ProviderSourceConfig>) -> Self {
        self.explicit = explicit;
        self
    }

    /// Sets how environment credentials are read for each provider.
    #[must_use]
    pub fn with_env_credentials<F>(mut self, lookup: F) -> Self
    where
        F: Fn(ProviderKind) -> ProviderCredentials + Send + Sync + 'static,
    {
        self.env_credentials = Arc::new(lookup);
        self
    }

    /// Sets the per-adapter timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the result cache TTL. Drops cached entries.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }

    /// Returns the result cache.
    pub fn cache(&self) -> &TtlCache<UsageData> {
        &self.cache
    }

    /// Removes expired cache entries.
    pub fn prune_cache(&self) -> usize {
        self.cache.prune()
    }

    /// Returns usage for every provider that produced data.
    pub async fn fetch_all(
        &self,
        period: &TimePeriod,
        provider_filter: Option<ProviderKind>,
    ) -> Vec<UsageData> {
        self.fetch_all_with_report(period, provider_filter).await.0
    }

    /// Like [`fetch_all`](Self::fetch_all), also reporting each provider's outcome.
    #[instrument(skip(self, period), fields(period = %period.cache_key()))]
    pub async fn fetch_all_with_report(
        &self,
        period: &TimePeriod,
        provider_filter: Option<ProviderKind>,
    ) -> (Vec<UsageData>, Vec<SourceAttempt>) {
        let mut results = Vec::new();
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let kind = provider.kind();
            let attempt = |outcome| SourceAttempt { provider: kind, outcome };

            if provider_filter.is_some_and(|f| f != kind) {
                attempts.push(attempt(AttemptOutcome::SkippedFilter));
                continue;
            }

            let key = cache_key(kind, period);
            if let Some(cached) = self.cache.get(&key) {
                debug!(provider = %kind, "Serving cached usage");
                results.push(cached);
                attempts.push(attempt(AttemptOutcome::Cached));
                continue;
            }

            let explicit = self.explicit.iter().find(|p| p.kind == kind);
            if explicit.is_some_and(|p| !p.enabled) {
                debug!(provider = %kind, "Provider disabled");
                attempts.push(attempt(AttemptOutcome::SkippedDisabled));
                continue;
            }

            let env = (self.env_credentials)(kind);
            let credentials = match explicit {
                Some(p) => env.merge(&p.credentials),
                None => env,
            };
            if !provider.is_configured(&credentials) {
                debug!(provider = %kind, "Provider not configured");
                attempts.push(attempt(AttemptOutcome::SkippedUnconfigured));
                continue;
            }

            let outcome = match self.fetch_one(provider.as_ref(), &credentials, period).await {
                Ok(data) => {
                    self.cache.set(key, data.clone());
                    results.push(data);
                    AttemptOutcome::Fetched
                }
                Err(e) => {
                    warn!(
                        provider = %kind,
                        kind = e.kind.as_str(),
                        error = %e,
                        "Usage fetch failed"
                    );
                    AttemptOutcome::Failed(e)
                }
            };
            attempts.push(attempt(outcome));
        }

        info!(results = results.len(), providers = self.providers.len(), "Aggregated usage");
        (results, attempts)
    }

    async fn fetch_one(
        &self,
        provider: &dyn UsageProvider,
        credentials: &ProviderCredentials,
        period: &TimePeriod,
    ) -> Result<UsageData, ApiError> {
        match tokio::time::timeout(self.timeout, provider.fetch_usage(credentials, period)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::network(format!(
                "Request timed out after {}s",
                self.timeout.as_secs()
            ))
            .with_provider(provider.kind())),
        }
    }
}

impl std::fmt::Debug for UsageAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<_> = self.providers.iter().map(|p| p.kind()).collect();
        f.debug_struct("UsageAggregator")
            .field("providers", &kinds)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Cache key for one provider and period.
pub fn cache_key(kind: ProviderKind, period: &TimePeriod) -> String {
    format!("{}:{}", kind.cli_name(), period.cache_key())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use usagemon_core::{ApiErrorKind, CostInfo, TokenUsage};

    struct FakeProvider {
        kind: ProviderKind,
        fail: bool,
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<ProviderCredentials>>>,
    }

    impl FakeProvider {
        fn boxed(
            kind: ProviderKind,
            fail: bool,
            calls: &Arc<AtomicUsize>,
        ) -> Box<dyn UsageProvider> {
            Box::new(Self {
                kind,
                fail,
                calls: Arc::clone(calls),
                seen: Arc::new(Mutex::new(Vec::new())),
            })
        }
    }

    #[async_trait]
    impl UsageProvider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn is_configured(&self, credentials: &ProviderCredentials) -> bool {
            credentials.api_key().is_some()
        }

        async fn fetch_usage(
            &self,
            credentials: &ProviderCredentials,
            period: &TimePeriod,
        ) -> Result<UsageData, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(credentials.clone());
            if self.fail {
                return Err(ApiError::from_status(500, "boom").with_provider(self.kind));
            }
            Ok(UsageData::new(
                self.kind,
                TokenUsage::new(60, 40),
                CostInfo::usd(1.5),
                *period,
            ))
        }
    }

    fn period() -> TimePeriod {
        let end = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        TimePeriod::last_days(end, 7)
    }

    fn keyed(kind: ProviderKind, key: &str) -> ProviderSourceConfig {
        ProviderSourceConfig {
            kind,
            enabled: true,
            credentials: ProviderCredentials::with_api_key(key),
        }
    }

    #[tokio::test]
    async fn test_partial_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = UsageAggregator::new(vec![
            FakeProvider::boxed(ProviderKind::Anthropic, false, &calls),
            FakeProvider::boxed(ProviderKind::OpenAI, true, &calls),
            FakeProvider::boxed(ProviderKind::OpenRouter, false, &calls),
        ])
        .with_env_credentials(|_| ProviderCredentials::with_api_key("env-key"));

        let (results, attempts) = aggregator.fetch_all_with_report(&period(), None).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].provider, ProviderKind::Anthropic);
        assert_eq!(results[1].provider, ProviderKind::OpenRouter);
        assert!(matches!(
            &attempts[1].outcome,
            AttemptOutcome::Failed(e) if e.kind == ApiErrorKind::Api
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = UsageAggregator::new(vec![FakeProvider::boxed(
            ProviderKind::Anthropic,
            false,
            &calls,
        )])
        .with_provider_config(vec![keyed(ProviderKind::Anthropic, "sk-ant")]);

        aggregator.fetch_all(&period(), None).await;
        let (results, attempts) = aggregator.fetch_all_with_report(&period(), None).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), 1);
        assert_eq!(attempts[0].outcome, AttemptOutcome::Cached);
    }

    #[tokio::test]
    async fn test_filter_excludes_cached_providers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = UsageAggregator::new(vec![
            FakeProvider::boxed(ProviderKind::Anthropic, false, &calls),
            FakeProvider::boxed(ProviderKind::OpenAI, false, &calls),
        ])
        .with_env_credentials(|_| ProviderCredentials::with_api_key("env-key"));

        assert_eq!(aggregator.fetch_all(&period(), None).await.len(), 2);
        let (filtered, attempts) = aggregator
            .fetch_all_with_report(&period(), Some(ProviderKind::OpenAI))
            .await;

        let providers: Vec<_> = filtered.iter().map(|u| u.provider).collect();
        assert_eq!(providers, vec![ProviderKind::OpenAI]);
        assert_eq!(attempts[0].outcome, AttemptOutcome::SkippedFilter);
        assert_eq!(attempts[1].outcome, AttemptOutcome::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_served_for_disabled_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = UsageAggregator::new(vec![FakeProvider::boxed(
            ProviderKind::OpenAI,
            false,
            &calls,
        )])
        .with_provider_config(vec![keyed(ProviderKind::OpenAI, "sk-openai")]);
        aggregator.fetch_all(&period(), None).await;

        let mut disabled = keyed(ProviderKind::OpenAI, "sk-openai");
        disabled.enabled = false;
        let aggregator = aggregator.with_provider_config(vec![disabled]);

        let (results, attempts) = aggregator.fetch_all_with_report(&period(), None).await;
        assert_eq!(results.len(), 1);
        assert_eq!(attempts[0].outcome, AttemptOutcome::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_skips_disabled_filtered_and_unconfigured() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut disabled = keyed(ProviderKind::Google, "g-key");
        disabled.enabled = false;

        let aggregator = UsageAggregator::new(vec![
            FakeProvider::boxed(ProviderKind::Anthropic, false, &calls),
            FakeProvider::boxed(ProviderKind::OpenAI, false, &calls),
            FakeProvider::boxed(ProviderKind::Google, false, &calls),
            FakeProvider::boxed(ProviderKind::OpenRouter, false, &calls),
        ])
        .with_provider_config(vec![keyed(ProviderKind::Anthropic, "sk-ant"), disabled]);

        let (results, attempts) = aggregator
            .fetch_all_with_report(&period(), Some(ProviderKind::Anthropic))
            .await;
        assert_eq!(results.len(), 1);
        let outcomes: Vec<_> = attempts.into_iter().map(|a| a.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                AttemptOutcome::Fetched,
                AttemptOutcome::SkippedFilter,
                AttemptOutcome::SkippedFilter,
                AttemptOutcome::SkippedFilter,
            ]
        );

        let (results, attempts) = aggregator.fetch_all_with_report(&period(), None).await;
        assert_eq!(results.len(), 1);
        assert_eq!(attempts[1].outcome, AttemptOutcome::SkippedUnconfigured);
        assert_eq!(attempts[2].outcome, AttemptOutcome::SkippedDisabled);
        assert!(aggregator.cache().len() == 1);
    }

    #[tokio::test]
    async fn test_explicit_credentials_win() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = FakeProvider {
            kind: ProviderKind::OpenAI,
            fail: false,
            calls: Arc::clone(&calls),
            seen: Arc::clone(&seen),
        };

        let mut explicit = keyed(ProviderKind::OpenAI, "explicit-key");
        explicit.credentials.organization_id = None;
        let aggregator = UsageAggregator::new(vec![Box::new(provider)])
            .with_provider_config(vec![explicit])
            .with_env_credentials(|_| ProviderCredentials {
                api_key: Some("env-key".into()),
                organization_id: Some("org-env".into()),
                project_id: None,
            });

        aggregator.fetch_all(&period(), None).await;
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].api_key.as_deref(), Some("explicit-key"));
        assert_eq!(seen[0].organization_id.as_deref(), Some("org-env"));
    }

    #[tokio::test]
    async fn test_empty_output_is_valid() {
        let aggregator = UsageAggregator::new(Vec::new());
        assert!(aggregator.fetch_all(&period(), None).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_cache_after_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = UsageAggregator::new(vec![FakeProvider::boxed(
            ProviderKind::OpenRouter,
            false,
            &calls,
        )])
        .with_env_credentials(|_| ProviderCredentials::with_api_key("or-key"));

        aggregator.fetch_all(&period(), None).await;
        assert_eq!(aggregator.prune_cache(), 0);
        tokio::time::advance(AGGREGATOR_CACHE_TTL + Duration::from_secs(1)).await;
        assert_eq!(aggregator.prune_cache(), 1);
    }
}
