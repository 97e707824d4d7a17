//! Polling monitor.
//!
//! A [`PollingMonitor`] owns one bound [`PollSource`], a cancellable timer
//! task, a listener set and the latest [`MonitorState`]. Each tick fetches
//! from the source, updates the state and notifies listeners.
//!
//! Lifecycle:
//!
//! ```text
//!            start()                  stop()
//! stopped ───────────▶ running ───────────────▶ stopped
//!            (emit start,           (cancel tick wait,
//!             fetch now,             bump generation,
//!             tick every N s)        emit stop)
//! ```
//!
//! `stop()` only cancels the wait for the next tick. A fetch already in
//! flight completes, updates the state and emits its event; listeners that
//! must not see it should unsubscribe when calling `stop()`.
//!
//! State and timer bookkeeping sit behind one short `std::sync::Mutex` that
//! is never held across an `.await` or while listeners run.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use usagemon_core::{ApiError, ApiErrorKind, PollSource};

use crate::config::ResolvedConfig;
use crate::events::{EventBus, Subscription};

// ============================================================================
// State & Events
// ============================================================================

/// Snapshot of a monitor. Callers always receive copies.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorState<T> {
    /// True between `start()` and `stop()`.
    pub is_running: bool,
    /// Completion time of the last fetch attempt.
    pub last_fetch: Option<DateTime<Utc>>,
    /// Message of the last failed attempt; cleared on success.
    pub last_error: Option<String>,
    /// Classification of `last_error`.
    pub last_error_kind: Option<ApiErrorKind>,
    /// Last successful payload; kept across failures.
    pub payload: Option<T>,
}

impl<T> Default for MonitorState<T> {
    fn default() -> Self {
        Self {
            is_running: false,
            last_fetch: None,
            last_error: None,
            last_error_kind: None,
            payload: None,
        }
    }
}

/// Kind of monitor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEventKind {
    /// Monitor started.
    Start,
    /// Monitor stopped.
    Stop,
    /// A fetch succeeded.
    Update,
    /// A fetch failed.
    Error,
}

impl MonitorEventKind {
    /// Returns the lowercase event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorEventKind::Start => "start",
            MonitorEventKind::Stop => "stop",
            MonitorEventKind::Update => "update",
            MonitorEventKind::Error => "error",
        }
    }
}

impl fmt::Display for MonitorEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered to monitor listeners.
#[derive(Debug, Clone)]
pub struct MonitorEvent<T> {
    /// What happened.
    pub kind: MonitorEventKind,
    /// State right after it happened.
    pub state: MonitorState<T>,
    /// When it happened.
    pub at: DateTime<Utc>,
}

// ============================================================================
// Source Plan
// ============================================================================

type ConfigFn<R> = Arc<dyn Fn(&ResolvedConfig) -> R + Send + Sync>;

/// How a monitor derives its source from configuration.
///
/// - `enabled`: feature toggle; a disabled monitor never runs.
/// - `identity`: credential identity; a change rebinds the source.
/// - `bind`: builds the source for a configuration.
pub struct SourcePlan<T> {
    name: String,
    enabled: ConfigFn<bool>,
    identity: ConfigFn<String>,
    bind: ConfigFn<Arc<dyn PollSource<Output = T>>>,
}

impl<T: Clone + Send + Sync + 'static> SourcePlan<T> {
    /// Creates a plan that is always enabled and never rebinds.
    pub fn new<F>(name: impl Into<String>, bind: F) -> Self
    where
        F: Fn(&ResolvedConfig) -> Arc<dyn PollSource<Output = T>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            enabled: Arc::new(|_| true),
            identity: Arc::new(|_| String::new()),
            bind: Arc::new(bind),
        }
    }

    /// Sets the feature toggle.
    #[must_use]
    pub fn with_enabled<F>(mut self, enabled: F) -> Self
    where
        F: Fn(&ResolvedConfig) -> bool + Send + Sync + 'static,
    {
        self.enabled = Arc::new(enabled);
        self
    }

    /// Sets the credential identity.
    #[must_use]
    pub fn with_identity<F>(mut self, identity: F) -> Self
    where
        F: Fn(&ResolvedConfig) -> String + Send + Sync + 'static,
    {
        self.identity = Arc::new(identity);
        self
    }

    /// Returns the plan name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether `config` enables this source.
    pub fn is_enabled(&self, config: &ResolvedConfig) -> bool {
        (self.enabled)(config)
    }
}

impl<T> fmt::Debug for SourcePlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcePlan")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Monitor
// ============================================================================

struct Control<T> {
    state: MonitorState<T>,
    source: Arc<dyn PollSource<Output = T>>,
    identity: String,
    enabled: bool,
    interval: Duration,
    timeout: Duration,
    timer: Option<Timer>,
    generation: u64,
}

struct Timer {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct Shared<T> {
    plan: SourcePlan<T>,
    control: Mutex<Control<T>>,
    events: EventBus<MonitorEvent<T>>,
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Control<T>> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, kind: MonitorEventKind, state: MonitorState<T>) {
        self.events.emit(&MonitorEvent {
            kind,
            state,
            at: Utc::now(),
        });
    }

    /// Runs one fetch. With `generation` set, the fetch only starts if the
    /// timer that requested it is still current.
    async fn fetch(&self, generation: Option<u64>) -> Option<Result<T, ApiError>> {
        let (source, timeout) = {
            let control = self.lock();
            if let Some(generation) = generation {
                if control.generation != generation || !control.state.is_running {
                    return None;
                }
            }
            (Arc::clone(&control.source), control.timeout)
        };

        debug!(monitor = %self.plan.name, source = source.name(), "Fetching");
        let result = match tokio::time::timeout(timeout, source.poll()).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::network(format!(
                "Request timed out after {}s",
                timeout.as_secs()
            ))),
        };

        let now = Utc::now();
        let (kind, snapshot) = {
            let mut control = self.lock();
            let state = &mut control.state;
            state.last_fetch = Some(now);
            let kind = match &result {
                Ok(payload) => {
                    state.payload = Some(payload.clone());
                    state.last_error = None;
                    state.last_error_kind = None;
                    MonitorEventKind::Update
                }
                Err(e) => {
                    state.last_error = Some(e.to_string());
                    state.last_error_kind = Some(e.kind);
                    MonitorEventKind::Error
                }
            };
            (kind, state.clone())
        };

        if let Err(e) = &result {
            warn!(monitor = %self.plan.name, kind = e.kind.as_str(), error = %e, "Fetch failed");
        }
        self.emit(kind, snapshot);
        Some(result)
    }
}

async fn run_timer<T: Clone + Send + Sync + 'static>(
    shared: Weak<Shared<T>>,
    generation: u64,
    period: Duration,
    mut cancelled: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        // Cancellation only interrupts the wait; a started fetch runs to the end.
        tokio::select! {
            biased;
            _ = &mut cancelled => break,
            _ = ticker.tick() => {}
        }
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if shared.fetch(Some(generation)).await.is_none() {
            break;
        }
    }
}

/// Polls one source on a fixed interval and notifies listeners.
///
/// Must be started from within a tokio runtime.
pub struct PollingMonitor<T: Clone + Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + Sync + 'static> PollingMonitor<T> {
    /// Creates a stopped monitor and binds its source from `config`.
    pub fn new(plan: SourcePlan<T>, config: &ResolvedConfig) -> Self {
        let control = Control {
            state: MonitorState::default(),
            source: (plan.bind)(config),
            identity: (plan.identity)(config),
            enabled: (plan.enabled)(config),
            interval: config.refresh_interval(),
            timeout: config.fetch_timeout(),
            timer: None,
            generation: 0,
        };
        Self {
            shared: Arc::new(Shared {
                plan,
                control: Mutex::new(control),
                events: EventBus::new(),
            }),
        }
    }

    /// Returns the monitor name.
    pub fn name(&self) -> &str {
        &self.shared.plan.name
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> MonitorState<T> {
        self.shared.lock().state.clone()
    }

    /// Returns true while the timer is running.
    pub fn is_running(&self) -> bool {
        self.shared.lock().state.is_running
    }

    /// Registers a listener for every monitor event.
    pub fn on<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&MonitorEvent<T>) + Send + Sync + 'static,
    {
        self.shared.events.on(listener)
    }

    /// Starts polling: emits `start`, fetches immediately, then every
    /// `refresh_interval`. No-op if running or disabled.
    pub fn start(&self) {
        let (generation, snapshot) = {
            let mut control = self.shared.lock();
            if control.state.is_running {
                return;
            }
            if !control.enabled {
                debug!(monitor = %self.name(), "Monitor disabled, not starting");
                return;
            }
            control.state.is_running = true;
            control.generation += 1;
            (control.generation, control.state.clone())
        };

        info!(monitor = %self.name(), "Monitor started");
        self.shared.emit(MonitorEventKind::Start, snapshot);

        // Spawned after the start event so `update` can never precede it.
        let mut control = self.shared.lock();
        if control.generation == generation && control.state.is_running {
            let (cancel, cancelled) = oneshot::channel();
            let task = run_timer(
                Arc::downgrade(&self.shared),
                generation,
                control.interval,
                cancelled,
            );
            control.timer = Some(Timer {
                cancel,
                task: tokio::spawn(task),
            });
        }
    }

    /// Stops polling. No-op if stopped.
    ///
    /// No fetch begins after this returns, but one already in flight still
    /// completes and emits `update` or `error`.
    pub fn stop(&self) {
        let snapshot = {
            let mut control = self.shared.lock();
            if !control.state.is_running {
                return;
            }
            if let Some(timer) = control.timer.take() {
                let _ = timer.cancel.send(());
            }
            control.generation += 1;
            control.state.is_running = false;
            control.state.clone()
        };

        info!(monitor = %self.name(), "Monitor stopped");
        self.shared.emit(MonitorEventKind::Stop, snapshot);
    }

    /// Fetches once, outside the timer. Works while stopped.
    #[instrument(skip(self), fields(monitor = %self.name()))]
    pub async fn fetch(&self) -> Result<T, ApiError> {
        match self.shared.fetch(None).await {
            Some(result) => result,
            None => Err(ApiError::new(ApiErrorKind::Api, "Fetch skipped")),
        }
    }

    /// Applies a new configuration.
    ///
    /// Rebinds the source when the credential identity changed, restarts
    /// when the interval changed while running, and follows the feature
    /// toggle. Applying the same configuration twice is a no-op.
    pub fn update_config(&self, config: &ResolvedConfig) {
        let plan = &self.shared.plan;
        let identity = (plan.identity)(config);
        let enabled = (plan.enabled)(config);
        let interval = config.refresh_interval();

        let (running, was_enabled, interval_changed) = {
            let mut control = self.shared.lock();
            if control.identity != identity {
                info!(monitor = %plan.name, "Credentials changed, rebinding source");
                control.source = (plan.bind)(config);
                control.identity = identity;
            }
            let interval_changed = control.interval != interval;
            let was_enabled = control.enabled;
            control.interval = interval;
            control.timeout = config.fetch_timeout();
            control.enabled = enabled;
            (control.state.is_running, was_enabled, interval_changed)
        };

        if running && !enabled {
            self.stop();
        } else if running && interval_changed {
            debug!(
                monitor = %plan.name,
                interval_secs = interval.as_secs(),
                "Interval changed, restarting"
            );
            self.stop();
            self.start();
        } else if !running && enabled && !was_enabled {
            self.start();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for PollingMonitor<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.lock().timer.take() {
            timer.task.abort();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> fmt::Debug for PollingMonitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingMonitor")
            .field("name", &self.name())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays scripted results; repeats the last one when exhausted.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<u64, ApiError>>>,
        last: Mutex<Option<Result<u64, ApiError>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<u64, ApiError>>, calls: Arc<AtomicUsize>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                calls,
            }
        }
    }

    #[async_trait]
    impl PollSource for ScriptedSource {
        type Output = u64;

        fn name(&self) -> &str {
            "scripted"
        }

        async fn poll(&self) -> Result<u64, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(next) = next {
                *last = Some(next);
            }
            last.clone().unwrap_or(Ok(0))
        }
    }

    fn rate_limited() -> ApiError {
        ApiError::from_status(429, "Too many requests")
    }

    fn config_with_interval(secs: u64) -> ResolvedConfig {
        let mut config = ResolvedConfig::default();
        config.display.refresh_interval = secs;
        config
    }

    fn scripted_plan(
        script: Vec<Result<u64, ApiError>>,
        calls: Arc<AtomicUsize>,
    ) -> SourcePlan<u64> {
        let source: Arc<dyn PollSource<Output = u64>> =
            Arc::new(ScriptedSource::new(script, calls));
        SourcePlan::new("test", move |_| Arc::clone(&source))
    }

    fn record_events(monitor: &PollingMonitor<u64>) -> Arc<Mutex<Vec<MonitorEventKind>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let _ = monitor.on(move |event| sink.lock().unwrap().push(event.kind));
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_then_rate_limit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let plan = scripted_plan(vec![Ok(100), Err(rate_limited())], Arc::clone(&calls));
        let monitor = PollingMonitor::new(plan, &config_with_interval(10));
        let events = record_events(&monitor);

        monitor.start();
        tokio::time::sleep(Duration::from_secs(15)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                MonitorEventKind::Start,
                MonitorEventKind::Update,
                MonitorEventKind::Error
            ]
        );

        let state = monitor.state();
        assert!(state.is_running);
        assert_eq!(state.payload, Some(100));
        assert_eq!(state.last_error.as_deref(), Some("Too many requests"));
        assert_eq!(state.last_error_kind, Some(ApiErrorKind::RateLimit));
        assert!(state.last_fetch.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let monitor = PollingMonitor::new(
            scripted_plan(vec![Ok(1)], Arc::clone(&calls)),
            &config_with_interval(10),
        );
        let events = record_events(&monitor);

        monitor.stop();
        monitor.start();
        monitor.start();
        monitor.stop();
        monitor.stop();

        assert_eq!(
            *events.lock().unwrap(),
            vec![MonitorEventKind::Start, MonitorEventKind::Stop]
        );
        assert!(!monitor.is_running());

        // The cancelled timer never fetches.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_fetch_completes_after_stop() {
        struct Slow {
            calls: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl PollSource for Slow {
            type Output = u64;

            fn name(&self) -> &str {
                "slow"
            }

            async fn poll(&self) -> Result<u64, ApiError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(9)
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let source: Arc<dyn PollSource<Output = u64>> = Arc::new(Slow {
            calls: Arc::clone(&calls),
        });
        let plan = SourcePlan::new("slow", move |_| Arc::clone(&source));
        let monitor = PollingMonitor::new(plan, &config_with_interval(10));
        let events = record_events(&monitor);

        monitor.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        monitor.stop();
        assert_eq!(monitor.state().payload, None);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                MonitorEventKind::Start,
                MonitorEventKind::Stop,
                MonitorEventKind::Update
            ]
        );
        let state = monitor.state();
        assert!(!state.is_running);
        assert_eq!(state.payload, Some(9));
        assert!(state.last_fetch.is_some());
        // No tick fires after the in-flight fetch.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_overlapping_timers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let monitor = PollingMonitor::new(
            scripted_plan(vec![Ok(1)], Arc::clone(&calls)),
            &config_with_interval(10),
        );
        monitor.start();
        tokio::time::sleep(Duration::from_millis(1)).await;

        for secs in [20, 30, 40] {
            monitor.update_config(&config_with_interval(secs));
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        let before = calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(100)).await;
        // One timer at 40s: ticks at +40 and +80.
        assert_eq!(calls.load(Ordering::SeqCst) - before, 2);
    }

    #[tokio::test]
    async fn test_fetch_while_stopped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let monitor = PollingMonitor::new(
            scripted_plan(vec![Ok(5)], Arc::clone(&calls)),
            &ResolvedConfig::default(),
        );
        let events = record_events(&monitor);

        assert_eq!(monitor.fetch().await.unwrap(), 5);
        assert!(!monitor.is_running());
        assert_eq!(monitor.state().payload, Some(5));
        assert_eq!(*events.lock().unwrap(), vec![MonitorEventKind::Update]);
    }

    #[tokio::test]
    async fn test_stale_on_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let monitor = PollingMonitor::new(
            scripted_plan(
                vec![Ok(42), Err(ApiError::credentials_missing("No API key configured"))],
                Arc::clone(&calls),
            ),
            &ResolvedConfig::default(),
        );

        monitor.fetch().await.unwrap();
        let err = monitor.fetch().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::CredentialsMissing);

        let state = monitor.state();
        assert_eq!(state.payload, Some(42));
        assert_eq!(state.last_error.as_deref(), Some("No API key configured"));
    }

    #[tokio::test]
    async fn test_success_clears_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let monitor = PollingMonitor::new(
            scripted_plan(vec![Err(rate_limited()), Ok(7)], Arc::clone(&calls)),
            &ResolvedConfig::default(),
        );

        monitor.fetch().await.unwrap_err();
        assert!(monitor.state().last_error.is_some());
        monitor.fetch().await.unwrap();

        let state = monitor.state();
        assert!(state.last_error.is_none());
        assert!(state.last_error_kind.is_none());
        assert_eq!(state.payload, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_is_network_error() {
        struct Hanging;

        #[async_trait]
        impl PollSource for Hanging {
            type Output = u64;

            fn name(&self) -> &str {
                "hanging"
            }

            async fn poll(&self) -> Result<u64, ApiError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(1)
            }
        }

        let mut config = ResolvedConfig::default();
        config.fetch.timeout_secs = 5;
        let plan = SourcePlan::new("hanging", |_| {
            let source: Arc<dyn PollSource<Output = u64>> = Arc::new(Hanging);
            source
        });
        let monitor = PollingMonitor::new(plan, &config);

        let err = monitor.fetch().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Network);
        assert_eq!(monitor.state().last_error_kind, Some(ApiErrorKind::Network));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_config_rebinds_on_identity_change() {
        let binds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&binds);
        let plan = SourcePlan::new("keyed", move |config: &ResolvedConfig| {
            counter.fetch_add(1, Ordering::SeqCst);
            let key = config.anthropic.admin_api_key.clone().unwrap_or_default();
            let payload = key.len() as u64;
            let source: Arc<dyn PollSource<Output = u64>> = Arc::new(ScriptedSource::new(
                vec![Ok(payload)],
                Arc::new(AtomicUsize::new(0)),
            ));
            source
        })
        .with_identity(|config| config.anthropic.admin_api_key.clone().unwrap_or_default());

        let mut config = ResolvedConfig::default();
        config.anthropic.admin_api_key = Some("abc".into());
        let monitor = PollingMonitor::new(plan, &config);
        let events = record_events(&monitor);
        assert_eq!(binds.load(Ordering::SeqCst), 1);

        monitor.update_config(&config);
        monitor.update_config(&config);
        assert_eq!(binds.load(Ordering::SeqCst), 1);
        assert!(events.lock().unwrap().is_empty());

        config.anthropic.admin_api_key = Some("abcdef".into());
        monitor.update_config(&config);
        assert_eq!(binds.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.fetch().await.unwrap(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feature_toggle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let plan = scripted_plan(vec![Ok(1)], Arc::clone(&calls))
            .with_enabled(|config| config.oauth.enabled);

        let mut disabled = ResolvedConfig::default();
        disabled.oauth.enabled = false;
        let monitor = PollingMonitor::new(plan, &disabled);
        let events = record_events(&monitor);

        monitor.start();
        assert!(!monitor.is_running());

        let enabled = ResolvedConfig::default();
        monitor.update_config(&enabled);
        assert!(monitor.is_running());
        monitor.update_config(&enabled);

        monitor.update_config(&disabled);
        assert!(!monitor.is_running());

        let kinds: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .copied()
            .filter(|k| matches!(k, MonitorEventKind::Start | MonitorEventKind::Stop))
            .collect();
        assert_eq!(kinds, vec![MonitorEventKind::Start, MonitorEventKind::Stop]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribed_listener_is_silent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let monitor = PollingMonitor::new(
            scripted_plan(vec![Ok(1)], Arc::clone(&calls)),
            &ResolvedConfig::default(),
        );
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let sub = monitor.on(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        monitor.fetch().await.unwrap();
        sub.unsubscribe();
        monitor.fetch().await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
