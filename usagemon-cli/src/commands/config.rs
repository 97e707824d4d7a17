//! Config command - show the resolved configuration.

use anyhow::Result;
use usagemon_store::{ConfigSource, LoadConfigResult, default_config_path, mask_secret};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the config command.
pub fn run(cli: &Cli) -> Result<()> {
    // Warnings are part of the report, so load without printing them.
    let loaded = usagemon_store::load_config(cli.config.as_deref());

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_config(&loaded)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(cli.use_colors(loaded.config.widget.colors));
            println!("{}", render_text(&loaded, &formatter));
        }
    }
    Ok(())
}

fn render_text(loaded: &LoadConfigResult, fmt: &TextFormatter) -> String {
    let config = &loaded.config;
    let mut lines = vec![fmt.bold("usagemon Configuration"), "─".repeat(40)];

    let source = match (&loaded.source, &loaded.path) {
        (ConfigSource::File, Some(path)) => format!("file ({})", path.display()),
        (source, _) => source.to_string(),
    };
    lines.push(format!("Source: {source}"));
    if loaded.source != ConfigSource::File {
        lines.push(fmt.dim(&format!("Default path: {}", default_config_path().display())));
    }
    lines.push(String::new());

    let admin_key = config
        .anthropic
        .admin_api_key
        .as_deref()
        .map_or_else(|| "not set".to_string(), mask_secret);
    lines.push(format!(
        "Admin API:  {} (key: {admin_key})",
        enabled(config.anthropic.enabled)
    ));
    lines.push(format!(
        "OAuth:      {} (profile: {})",
        enabled(config.oauth.enabled),
        config.oauth.show_profile
    ));
    lines.push(format!("Refresh:    {}s", config.display.refresh_interval));
    lines.push(format!("Timeout:    {}s", config.fetch.timeout_secs));
    lines.push(format!("Currency:   {}", config.display.currency.code()));
    lines.push(format!(
        "Widget:     {} cols, {:?}, {:?}",
        config.widget.width, config.widget.style, config.widget.position
    ));

    if !config.providers.is_empty() {
        lines.push(String::new());
        lines.push("Providers:".to_string());
        for provider in &config.providers {
            let key = provider
                .credentials
                .api_key
                .as_deref()
                .map_or_else(|| "env".to_string(), mask_secret);
            lines.push(format!(
                "  • {:<11} {} (key: {key})",
                provider.kind.cli_name(),
                enabled(provider.enabled)
            ));
        }
    }

    if !loaded.warnings.is_empty() {
        lines.push(String::new());
        lines.push(fmt.yellow("Warnings:"));
        for warning in &loaded.warnings {
            lines.push(format!("  • {warning}"));
        }
    }

    lines.join("\n")
}

fn enabled(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}
