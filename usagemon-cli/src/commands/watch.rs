//! Watch command - live dashboard of rate limits and API cost.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::io::{Write, stdout};
use tokio::sync::mpsc;
use tracing::{debug, info};
use usagemon_core::{RateLimitSnapshot, UsageSummary};
use usagemon_fetch::HttpClient;
use usagemon_store::{
    MonitorEventKind, PollingMonitor, Position, ResolvedConfig, Subscription,
};

use crate::monitors::{cost_plan, rate_limit_plan};
use crate::output::{
    JsonFormatter, TextFormatter, WidgetOptions, cost_widget, rate_limits_widget, status_bar,
};
use crate::{Cli, OutputFormat};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const DEFAULT_COLUMNS: usize = 80;

/// Arguments for watch command.
#[derive(Args, Default)]
pub struct WatchArgs {
    /// Fetch once, print the widgets and exit.
    #[arg(long, short = '1')]
    pub once: bool,

    /// Only show Admin API usage.
    #[arg(long, conflicts_with = "oauth_only")]
    pub api_only: bool,

    /// Only show OAuth rate limits.
    #[arg(long, visible_alias = "rate-limits")]
    pub oauth_only: bool,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Default)]
struct Dashboard {
    rate_limits: Option<PollingMonitor<RateLimitSnapshot>>,
    api_usage: Option<PollingMonitor<UsageSummary>>,
    subscriptions: Vec<Subscription>,
}

impl Dashboard {
    fn wants_rate_limits(args: &WatchArgs, config: &ResolvedConfig) -> bool {
        !args.api_only && config.oauth.enabled && config.display.show_rate_limits
    }

    fn wants_api_usage(args: &WatchArgs, config: &ResolvedConfig) -> bool {
        !args.oauth_only
            && config.anthropic.enabled
            && config.display.show_api_usage
            && config.anthropic.admin_api_key.is_some()
    }

    /// Creates any monitor `config` asks for that does not exist yet and
    /// forwards every other monitor the new configuration.
    fn apply(
        &mut self,
        args: &WatchArgs,
        config: &ResolvedConfig,
        client: &HttpClient,
        redraw: Option<&mpsc::UnboundedSender<()>>,
    ) -> bool {
        let mut created = false;

        if let Some(monitor) = &self.rate_limits {
            monitor.update_config(config);
        } else if Self::wants_rate_limits(args, config) {
            let monitor = PollingMonitor::new(rate_limit_plan(client.clone()), config);
            if let Some(tx) = redraw {
                self.subscriptions.push(notify_on_change(&monitor, tx.clone()));
            }
            self.rate_limits = Some(monitor);
            created = true;
        }

        if let Some(monitor) = &self.api_usage {
            monitor.update_config(config);
        } else if Self::wants_api_usage(args, config) {
            let monitor = PollingMonitor::new(cost_plan(client.clone()), config);
            if let Some(tx) = redraw {
                self.subscriptions.push(notify_on_change(&monitor, tx.clone()));
            }
            self.api_usage = Some(monitor);
            created = true;
        }

        created
    }

    fn is_empty(&self) -> bool {
        self.rate_limits.is_none() && self.api_usage.is_none()
    }

    fn start(&self) {
        if let Some(monitor) = &self.rate_limits {
            monitor.start();
        }
        if let Some(monitor) = &self.api_usage {
            monitor.start();
        }
    }

    fn stop(&self) {
        if let Some(monitor) = &self.rate_limits {
            monitor.stop();
        }
        if let Some(monitor) = &self.api_usage {
            monitor.stop();
        }
    }

    async fn fetch_once(&self) {
        if let Some(monitor) = &self.rate_limits {
            if let Err(e) = monitor.fetch().await {
                debug!(error = %e, "Rate limit fetch failed");
            }
        }
        if let Some(monitor) = &self.api_usage {
            if let Err(e) = monitor.fetch().await {
                debug!(error = %e, "API usage fetch failed");
            }
        }
    }

    fn render(&self, config: &ResolvedConfig, fmt: &TextFormatter, with_status: bool) -> String {
        let opts = WidgetOptions {
            width: config.widget.width,
            style: config.widget.style,
            currency: config.display.currency,
        };
        let now = Utc::now();
        let mut lines = Vec::new();
        let mut running = false;
        let mut last_error = None;

        if let Some(monitor) = &self.rate_limits {
            let state = monitor.state();
            running |= state.is_running;
            last_error = last_error.or(state.last_error.clone());
            lines.extend(rate_limits_widget(&state, opts, fmt, now));
        }
        if let Some(monitor) = &self.api_usage {
            let state = monitor.state();
            running |= state.is_running;
            last_error = last_error.or(state.last_error.clone());
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(cost_widget(&state, opts, fmt));
        }

        let indent = match config.widget.position {
            Position::Left => 0,
            Position::Right => terminal_columns().saturating_sub(opts.width),
        };
        let pad = " ".repeat(indent);
        let mut out: Vec<String> = lines.into_iter().map(|l| format!("{pad}{l}")).collect();

        if with_status {
            out.push(String::new());
            out.push(format!(
                "{pad}{}",
                status_bar(
                    fmt,
                    running,
                    last_error.as_deref(),
                    config.display.refresh_interval
                )
            ));
            out.push(format!("{pad}{}", fmt.dim("Press Ctrl+C to exit")));
        }
        out.join("\n")
    }
}

fn notify_on_change<T>(monitor: &PollingMonitor<T>, tx: mpsc::UnboundedSender<()>) -> Subscription
where
    T: Clone + Send + Sync + 'static,
{
    monitor.on(move |event| {
        if matches!(event.kind, MonitorEventKind::Update | MonitorEventKind::Error) {
            let _ = tx.send(());
        }
    })
}

fn terminal_columns() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse().ok())
        .unwrap_or(DEFAULT_COLUMNS)
}

// ============================================================================
// Terminal & signals
// ============================================================================

/// Hides the cursor while alive.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        print!("{HIDE_CURSOR}");
        stdout().flush()?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        print!("{SHOW_CURSOR}");
        let _ = stdout().flush();
    }
}

enum SignalEvent {
    Shutdown,
    Reload,
}

#[cfg(unix)]
struct Signals {
    hangup: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn new() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            hangup: signal(SignalKind::hangup())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn next(&mut self) -> SignalEvent {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => SignalEvent::Shutdown,
            _ = self.terminate.recv() => SignalEvent::Shutdown,
            _ = self.hangup.recv() => SignalEvent::Reload,
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> SignalEvent {
        let _ = tokio::signal::ctrl_c().await;
        SignalEvent::Shutdown
    }
}

// ============================================================================
// Entry
// ============================================================================

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let mut config = cli.load_config().config;
    let client = HttpClient::with_timeout(config.fetch_timeout());

    if args.once {
        return run_once(args, cli, &config, &client).await;
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dashboard = Dashboard::default();
    dashboard.apply(args, &config, &client, Some(&tx));
    if dashboard.is_empty() {
        anyhow::bail!(
            "Nothing to watch: enable OAuth rate limits or set ANTHROPIC_ADMIN_API_KEY"
        );
    }

    info!(interval = config.display.refresh_interval, "Starting watch mode");
    let mut signals = Signals::new()?;
    let _terminal = TerminalGuard::enter()?;
    let mut fmt = TextFormatter::new(cli.use_colors(config.widget.colors));

    dashboard.start();
    draw(&dashboard, &config, &fmt)?;

    loop {
        tokio::select! {
            Some(()) = rx.recv() => {
                // Coalesce bursts into one frame.
                while rx.try_recv().is_ok() {}
                draw(&dashboard, &config, &fmt)?;
            }
            event = signals.next() => match event {
                SignalEvent::Shutdown => break,
                SignalEvent::Reload => {
                    info!("Reloading configuration");
                    config = cli.load_config().config;
                    fmt = TextFormatter::new(cli.use_colors(config.widget.colors));
                    if dashboard.apply(args, &config, &client, Some(&tx)) {
                        dashboard.start();
                    }
                    draw(&dashboard, &config, &fmt)?;
                }
            },
        }
    }

    dashboard.stop();
    print!("{CLEAR_SCREEN}");
    stdout().flush()?;
    Ok(())
}

async fn run_once(
    args: &WatchArgs,
    cli: &Cli,
    config: &ResolvedConfig,
    client: &HttpClient,
) -> Result<()> {
    let mut dashboard = Dashboard::default();
    dashboard.apply(args, config, client, None);
    dashboard.fetch_once().await;

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let rate_limits = dashboard.rate_limits.as_ref().map(PollingMonitor::state);
            let api_usage = dashboard.api_usage.as_ref().map(PollingMonitor::state);
            println!(
                "{}",
                formatter.format_dashboard(rate_limits.as_ref(), api_usage.as_ref())?
            );
        }
        OutputFormat::Text => {
            if dashboard.is_empty() {
                println!("Nothing to show: OAuth rate limits are disabled and no admin API key is set.");
                return Ok(());
            }
            let fmt = TextFormatter::new(cli.use_colors(config.widget.colors));
            println!("{}", dashboard.render(config, &fmt, false));
        }
    }
    Ok(())
}

fn draw(dashboard: &Dashboard, config: &ResolvedConfig, fmt: &TextFormatter) -> Result<()> {
    let mut out = stdout().lock();
    write!(out, "{CLEAR_SCREEN}{}", dashboard.render(config, fmt, true))?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(api_only: bool, oauth_only: bool) -> WatchArgs {
        WatchArgs {
            once: true,
            api_only,
            oauth_only,
        }
    }

    #[test]
    fn test_cost_monitor_needs_admin_key() {
        let mut config = ResolvedConfig::default();
        assert!(!Dashboard::wants_api_usage(&args(false, false), &config));

        config.anthropic.admin_api_key = Some("sk-ant-admin01-key".to_string());
        assert!(Dashboard::wants_api_usage(&args(false, false), &config));
        assert!(!Dashboard::wants_api_usage(&args(false, true), &config));
    }

    #[test]
    fn test_api_only_skips_rate_limits() {
        let config = ResolvedConfig::default();
        assert!(Dashboard::wants_rate_limits(&args(false, false), &config));
        assert!(!Dashboard::wants_rate_limits(&args(true, false), &config));
    }

    #[tokio::test]
    async fn test_apply_creates_missing_monitors_once() {
        let mut config = ResolvedConfig::default();
        let client = HttpClient::new();
        let watch = args(false, false);
        let mut dashboard = Dashboard::default();

        assert!(dashboard.apply(&watch, &config, &client, None));
        assert!(dashboard.rate_limits.is_some());
        assert!(dashboard.api_usage.is_none());

        config.anthropic.admin_api_key = Some("sk-ant-admin01-key".to_string());
        assert!(dashboard.apply(&watch, &config, &client, None));
        assert!(dashboard.api_usage.is_some());

        assert!(!dashboard.apply(&watch, &config, &client, None));
    }

    #[test]
    fn test_render_without_monitors_is_empty() {
        let dashboard = Dashboard::default();
        let fmt = TextFormatter::new(false);
        assert_eq!(dashboard.render(&ResolvedConfig::default(), &fmt, false), "");
    }
}
