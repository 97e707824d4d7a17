// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! usagemon - Claude rate limits and LLM API usage in the terminal.
//!
//! # Examples
//!
//! ```bash
//! # Live dashboard (rate limits + month-to-date API cost)
//! usagemon
//!
//! # Print the widgets once and exit
//! usagemon watch --once
//!
//! # Only the OAuth rate-limit widget
//! usagemon watch --oauth-only
//!
//! # Seven-day usage across every configured provider
//! usagemon usage
//!
//! # One provider, JSON output
//! usagemon usage --provider openai --days 30 --format json
//!
//! # Show where the configuration came from
//! usagemon config
//! ```

mod commands;
mod monitors;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use usagemon_store::{LoadConfigResult, load_config};

use commands::{config, demo, usage, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// usagemon - LLM usage monitoring.
#[derive(Parser)]
#[command(name = "usagemon")]
#[command(about = "Claude rate limits and LLM API usage in the terminal")]
#[command(long_about = r#"
usagemon polls the Claude OAuth API for rate-limit windows and the Anthropic
Admin API for month-to-date cost, and renders both as terminal widgets.

The usage report aggregates token and cost data from:
  • Anthropic (anthropic)
  • OpenAI (openai)
  • Google (google)
  • OpenRouter (openrouter)

Examples:
  usagemon                         # Live dashboard
  usagemon watch --once            # Print once and exit
  usagemon usage --days 30         # Usage report
  usagemon config --format json    # Resolved configuration
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'watch' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file to use instead of the default search paths.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Loads configuration, reporting warnings on stderr.
    pub fn load_config(&self) -> LoadConfigResult {
        let loaded = load_config(self.config.as_deref());
        if !self.quiet {
            for warning in &loaded.warnings {
                eprintln!("Warning: {warning}");
            }
        }
        loaded
    }

    /// Whether text output should carry ANSI colors.
    pub fn use_colors(&self, configured: bool) -> bool {
        configured && !self.no_color
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Live dashboard (default if no command specified).
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Token usage and cost across providers.
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// Show the resolved configuration.
    Config,

    /// Render the widgets with sample data.
    Demo,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Exit codes for failed runs; success exits with 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
    /// Unknown provider name.
    ProviderMissing = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("usagemon=debug,info")
    } else {
        EnvFilter::new("usagemon=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        Some(Commands::Usage(args)) => usage::run(args, &cli).await,
        Some(Commands::Config) => config::run(&cli),
        Some(Commands::Demo) => demo::run(&cli),
        None => watch::run(&watch::WatchArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(exit_code(&e) as i32);
    }

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    if err.downcast_ref::<usage::UnknownProvider>().is_some() {
        ExitCode::ProviderMissing
    } else {
        ExitCode::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_for_unknown_provider() {
        let err = anyhow::Error::new(usage::UnknownProvider("codex".into()));
        assert_eq!(exit_code(&err), ExitCode::ProviderMissing);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), ExitCode::Error);
    }

    #[test]
    fn test_usage_days_is_bounded() {
        let days = |value: &str| {
            Cli::try_parse_from(["usagemon", "usage", "--days", value]).map(|cli| {
                match cli.command {
                    Some(Commands::Usage(args)) => args.days,
                    _ => unreachable!(),
                }
            })
        };

        assert_eq!(days("1").unwrap(), 1);
        assert_eq!(days("3650").unwrap(), 3650);
        assert!(days("0").is_err());
        assert!(days("3651").is_err());
        assert!(days("4000000000").is_err());
    }
}
