//! Demo command - render every widget with sample data.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use usagemon_core::{
    AccountInfo, CostInfo, ModelUsage, OrganizationInfo, ProfileData, ProviderKind,
    RateLimitSnapshot, RateLimitState, RateLimitWindow, TimePeriod, TokenUsage, UsageData,
    UsageSummary,
};
use usagemon_store::{MonitorState, ResolvedConfig};

use crate::Cli;
use crate::output::{
    TextFormatter, WidgetOptions, cost_widget, rate_limits_widget, status_bar,
};

/// Runs the demo command.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.load_config().config;
    let fmt = TextFormatter::new(cli.use_colors(config.widget.colors));
    println!("{}", render(&config, &fmt, Utc::now()));
    Ok(())
}

fn render(config: &ResolvedConfig, fmt: &TextFormatter, now: DateTime<Utc>) -> String {
    let opts = WidgetOptions {
        width: config.widget.width,
        style: config.widget.style,
        currency: config.display.currency,
    };

    let mut lines = rate_limits_widget(&running(sample_rate_limits(now), now), opts, fmt, now);
    lines.push(String::new());
    lines.extend(cost_widget(&running(sample_summary(now), now), opts, fmt));
    lines.push(String::new());
    lines.push(status_bar(fmt, true, None, config.display.refresh_interval));
    lines.push(String::new());
    lines.push(fmt.format_usage_summary(
        &sample_usage(now),
        config.display.currency,
        config.show_model_breakdown,
        config.compact_mode,
    ));
    lines.join("\n")
}

fn running<T>(payload: T, now: DateTime<Utc>) -> MonitorState<T> {
    MonitorState {
        is_running: true,
        last_fetch: Some(now),
        last_error: None,
        last_error_kind: None,
        payload: Some(payload),
    }
}

fn sample_rate_limits(now: DateTime<Utc>) -> RateLimitSnapshot {
    RateLimitSnapshot {
        rate_limits: Some(RateLimitState {
            five_hour: Some(RateLimitWindow::new(37.0, Some(now + Duration::minutes(134)))),
            seven_day: Some(RateLimitWindow::new(72.5, Some(now + Duration::hours(75)))),
            seven_day_oauth_apps: None,
            seven_day_opus: Some(RateLimitWindow::new(93.0, Some(now + Duration::hours(75)))),
        }),
        profile: Some(ProfileData {
            account: AccountInfo {
                uuid: "demo-account".to_string(),
                full_name: Some("Demo User".to_string()),
                display_name: Some("demo".to_string()),
                email: Some("demo@example.com".to_string()),
                has_claude_max: true,
                has_claude_pro: false,
            },
            organization: Some(OrganizationInfo {
                uuid: "demo-org".to_string(),
                name: "Demo Org".to_string(),
                organization_type: Some("claude_max".to_string()),
                billing_type: None,
                rate_limit_tier: None,
            }),
        }),
    }
}

fn sample_summary(now: DateTime<Utc>) -> UsageSummary {
    let period = TimePeriod::month_to_date(now);
    UsageSummary {
        total_input_tokens: 12_345_678,
        total_output_tokens: 987_654,
        total_cost: 47.25,
        period_start: period.start,
        period_end: period.end,
        last_updated: now,
    }
}

fn sample_usage(now: DateTime<Utc>) -> Vec<UsageData> {
    let period = TimePeriod::last_days(now, 7);
    vec![
        UsageData::new(
            ProviderKind::Anthropic,
            TokenUsage::new(1_200_000, 340_000),
            CostInfo::usd(18.4),
            period,
        )
        .with_model_breakdown(vec![ModelUsage {
            model_id: "claude-sonnet-4".to_string(),
            model_name: "Claude Sonnet 4".to_string(),
            usage: TokenUsage::new(1_200_000, 340_000),
            cost: CostInfo::usd(18.4),
            request_count: 412,
        }]),
        UsageData::new(
            ProviderKind::OpenRouter,
            TokenUsage::new(5_250, 0),
            CostInfo::usd(5.25),
            period,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::visible_width;

    #[test]
    fn test_demo_renders_all_sections() {
        let config = ResolvedConfig::default();
        let text = render(&config, &TextFormatter::new(false), Utc::now());

        assert!(text.contains("Claude Rate Limits"));
        assert!(text.contains("Plan: MAX"));
        assert!(text.contains("Opus (7d)"));
        assert!(text.contains("API Usage (This Month)"));
        assert!(text.contains("$47.25"));
        assert!(text.contains("● Running"));
        assert!(text.contains("**Total**:"));
    }

    #[test]
    fn test_demo_widgets_use_configured_width() {
        let mut config = ResolvedConfig::default();
        config.widget.width = 60;
        let text = render(&config, &TextFormatter::new(true), Utc::now());

        let widget_lines: Vec<&str> = text
            .lines()
            .take_while(|l| !l.contains("Running"))
            .filter(|l| !l.is_empty())
            .collect();
        assert!(!widget_lines.is_empty());
        for line in widget_lines {
            assert_eq!(visible_width(line), 60, "line {line:?}");
        }
    }
}
