//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Utc};
use usagemon_core::UsageData;
use usagemon_store::Currency;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Threshold-colored bar for a utilization percentage.
    pub fn progress_bar(&self, percent_used: f64, width: usize) -> String {
        let percent = clamp_percent(percent_used);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let filled = (((percent / 100.0) * width as f64).round() as usize).min(width);
        let empty = width - filled;

        let full = BAR_FULL.to_string().repeat(filled);
        let rest = BAR_EMPTY.to_string().repeat(empty);
        format!(
            "{}{}",
            self.color_for_percent(percent, &full),
            self.dim(&rest)
        )
    }

    /// Colors `text` by utilization: >=90 red, >=70 yellow, >=50 cyan, else green.
    pub fn color_for_percent(&self, percent_used: f64, text: &str) -> String {
        let color = if percent_used >= 90.0 {
            RED
        } else if percent_used >= 70.0 {
            YELLOW
        } else if percent_used >= 50.0 {
            CYAN
        } else {
            GREEN
        };
        self.paint(color, text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors && !text.is_empty() {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    pub(crate) fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    pub(crate) fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    pub(crate) fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    pub(crate) fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    pub(crate) fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    pub(crate) fn magenta(&self, text: &str) -> String {
        self.paint(MAGENTA, text)
    }

    pub(crate) fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    // ========================================================================
    // Usage report
    // ========================================================================

    /// Formats one provider's usage block.
    pub fn format_usage_data(&self, data: &UsageData, show_models: bool, compact: bool) -> String {
        let currency = Currency::from_code(&data.cost.currency);
        let mut lines = vec![
            self.bold(&format!("**{}**", data.provider.cli_name().to_uppercase())),
            format!("Period: {}", format_period(data.period.start, data.period.end)),
            format!(
                "Usage: {} tokens ({} in / {} out)",
                format_number(data.usage.total_tokens),
                format_number(data.usage.input_tokens),
                format_number(data.usage.output_tokens)
            ),
            format!("Cost: {}", format_cost(data.cost.total_cost, currency)),
        ];

        if let Some(models) = data.model_breakdown.as_ref().filter(|m| show_models && !m.is_empty()) {
            lines.push(String::new());
            lines.push("Model breakdown:".to_string());
            for model in models {
                let cost = format_cost(model.cost.total_cost, Currency::from_code(&model.cost.currency));
                if compact {
                    lines.push(format!("  • {}: {cost}", model.model_name));
                } else {
                    lines.push(format!(
                        "  • {}: {} tokens, {cost} ({} requests)",
                        model.model_name,
                        format_number(model.usage.total_tokens),
                        model.request_count
                    ));
                }
            }
        }

        lines.join("\n")
    }

    /// Formats the multi-provider usage summary.
    pub fn format_usage_summary(
        &self,
        usage: &[UsageData],
        currency: Currency,
        show_models: bool,
        compact: bool,
    ) -> String {
        if usage.is_empty() {
            return "No usage data available.".to_string();
        }

        let mut lines = vec![self.bold("## LLM Usage Summary"), String::new()];
        for data in usage {
            lines.push(self.format_usage_data(data, show_models, compact));
            lines.push(String::new());
        }

        let total_cost: f64 = usage.iter().map(|d| d.cost.total_cost).sum();
        let total_tokens: u64 = usage.iter().map(|d| d.usage.total_tokens).sum();
        lines.push("---".to_string());
        lines.push(format!(
            "**Total**: {} tokens, {}",
            format_number(total_tokens),
            format_cost(total_cost, currency)
        ));
        lines.join("\n")
    }

    /// Formats a failure line for one provider.
    pub fn format_error(&self, provider: &str, error: &str) -> String {
        format!("{} {}: {}", self.red("✗"), provider, error)
    }
}

// ============================================================================
// Formatting helpers
// ============================================================================

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Compact token count: `1.23M`, `4.5K`, `999`.
#[allow(clippy::cast_precision_loss)]
pub fn format_tokens(tokens: u64) -> String {
    if tokens >= 1_000_000 {
        format!("{:.2}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}K", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}

/// Integer with thousands separators: `1,234,567`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Amount with currency symbol and two decimals.
pub fn format_cost(amount: f64, currency: Currency) -> String {
    format!("{}{amount:.2}", currency.symbol())
}

/// Time until `resets_at`: `2d 3h`, `1h 5m`, `12m` or `now`.
pub fn format_time_until(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = resets_at - now;
    if diff <= chrono::Duration::zero() {
        return "now".to_string();
    }

    let hours = diff.num_hours();
    let minutes = diff.num_minutes() % 60;
    if hours > 24 {
        format!("{}d {}h", hours / 24, hours % 24)
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Period as `Mar 3 - Mar 10`, or a single date when both ends match.
pub fn format_period(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let start = start.format("%b %-d").to_string();
    let end = end.format("%b %-d").to_string();
    if start == end {
        start
    } else {
        format!("{start} - {end}")
    }
}
