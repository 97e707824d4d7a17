//! Usage command - aggregate token usage and cost across providers.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use thiserror::Error;
use tracing::info;
use usagemon_core::{ProviderKind, TimePeriod};
use usagemon_fetch::HttpClient;
use usagemon_providers::ProviderRegistry;
use usagemon_store::{AttemptOutcome, SourceAttempt, UsageAggregator};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the usage command.
#[derive(Args)]
pub struct UsageArgs {
    /// Provider to query: anthropic, openai, google or openrouter.
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Number of days to report, ending now (1 to 3650).
    #[arg(
        long,
        short,
        default_value = "7",
        value_parser = clap::value_parser!(u32).range(1..=3650)
    )]
    pub days: u32,
}

/// A `--provider` value that names no known provider.
#[derive(Debug, Error)]
#[error("Unknown provider: {0} (expected one of anthropic, openai, google, openrouter)")]
pub struct UnknownProvider(pub String);

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli) -> Result<()> {
    let filter = parse_provider(args.provider.as_deref())?;
    let config = cli.load_config().config;

    let client = HttpClient::with_timeout(config.fetch_timeout());
    let aggregator = UsageAggregator::new(ProviderRegistry::build_all(&client))
        .with_provider_config(config.providers.clone())
        .with_env_credentials(env_credentials)
        .with_timeout(config.fetch_timeout());

    let period = TimePeriod::last_days(Utc::now(), args.days);
    info!(days = args.days, provider = ?filter, "Fetching usage");
    let (usage, attempts) = aggregator.fetch_all_with_report(&period, filter).await;

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format_usage_report(&usage, &attempts, config.display.currency.code())?
            );
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(cli.use_colors(config.widget.colors));
            println!(
                "{}",
                formatter.format_usage_summary(
                    &usage,
                    config.display.currency,
                    config.show_model_breakdown,
                    config.compact_mode,
                )
            );
            if !cli.quiet {
                print_attempts(&formatter, &attempts, cli.verbose);
            }
        }
    }

    Ok(())
}

fn parse_provider(name: Option<&str>) -> Result<Option<ProviderKind>, UnknownProvider> {
    match name {
        None => Ok(None),
        Some(name) => ProviderRegistry::get_by_cli_name(name)
            .map(|desc| Some(desc.id))
            .ok_or_else(|| UnknownProvider(name.to_string())),
    }
}

fn env_credentials(kind: ProviderKind) -> usagemon_core::ProviderCredentials {
    ProviderRegistry::get(kind)
        .map(|desc| desc.env_credentials(|name| std::env::var(name).ok()))
        .unwrap_or_default()
}

fn print_attempts(formatter: &TextFormatter, attempts: &[SourceAttempt], verbose: bool) {
    let mut printed_header = false;
    for attempt in attempts {
        let line = match &attempt.outcome {
            AttemptOutcome::Failed(e) => formatter.format_error(attempt.provider.cli_name(), &e.message),
            AttemptOutcome::SkippedUnconfigured if verbose => {
                formatter.format_error(attempt.provider.cli_name(), "not configured")
            }
            AttemptOutcome::SkippedDisabled if verbose => {
                formatter.format_error(attempt.provider.cli_name(), "disabled")
            }
            _ => continue,
        };
        if !printed_header {
            eprintln!();
            printed_header = true;
        }
        eprintln!("{line}");
    }
}
