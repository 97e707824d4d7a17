//! Boxed dashboard widgets.

use chrono::{DateTime, Local, Utc};
use usagemon_core::{RateLimitSnapshot, UsageSummary};
use usagemon_store::{Currency, MonitorState, WidgetStyle};

use super::text::{TextFormatter, format_cost, format_time_until, format_tokens};

const LABEL_WIDTH: usize = 15;
const RESET_WIDTH: usize = 9;

// ============================================================================
// Box drawing
// ============================================================================

struct BoxChars {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
    tee_left: char,
    tee_right: char,
}

fn box_chars(style: WidgetStyle) -> BoxChars {
    match style {
        WidgetStyle::Rounded => BoxChars {
            top_left: '╭',
            top_right: '╮',
            bottom_left: '╰',
            bottom_right: '╯',
            horizontal: '─',
            vertical: '│',
            tee_left: '├',
            tee_right: '┤',
        },
        WidgetStyle::Square => BoxChars {
            top_left: '┌',
            top_right: '┐',
            bottom_left: '└',
            bottom_right: '┘',
            horizontal: '─',
            vertical: '│',
            tee_left: '├',
            tee_right: '┤',
        },
        WidgetStyle::Double => BoxChars {
            top_left: '╔',
            top_right: '╗',
            bottom_left: '╚',
            bottom_right: '╝',
            horizontal: '═',
            vertical: '║',
            tee_left: '╠',
            tee_right: '╣',
        },
        WidgetStyle::Simple => BoxChars {
            top_left: '+',
            top_right: '+',
            bottom_left: '+',
            bottom_right: '+',
            horizontal: '-',
            vertical: '|',
            tee_left: '+',
            tee_right: '+',
        },
    }
}

/// Printable width of `text`, ignoring ANSI escapes.
pub fn visible_width(text: &str) -> usize {
    strip_ansi_escapes::strip_str(text).chars().count()
}

/// A bordered block of rows.
pub struct Widget {
    chars: BoxChars,
    width: usize,
    lines: Vec<String>,
}

impl Widget {
    /// Starts a widget with a titled top border.
    pub fn new(title: &str, width: usize, style: WidgetStyle, fmt: &TextFormatter) -> Self {
        let chars = box_chars(style);
        let width = width.max(title.chars().count() + 6);
        let fill = width - title.chars().count() - 5;
        let top = format!(
            "{}{} {} {}{}",
            chars.top_left,
            chars.horizontal,
            fmt.bold(title),
            chars.horizontal.to_string().repeat(fill),
            chars.top_right
        );
        Self {
            chars,
            width,
            lines: vec![top],
        }
    }

    /// Inner content width.
    pub fn inner_width(&self) -> usize {
        self.width - 4
    }

    /// Adds a padded content row.
    pub fn row(&mut self, content: &str) -> &mut Self {
        let pad = self.inner_width().saturating_sub(visible_width(content));
        self.lines.push(format!(
            "{} {}{} {}",
            self.chars.vertical,
            content,
            " ".repeat(pad),
            self.chars.vertical
        ));
        self
    }

    /// Adds a horizontal divider.
    pub fn divider(&mut self) -> &mut Self {
        self.lines.push(format!(
            "{}{}{}",
            self.chars.tee_left,
            self.chars.horizontal.to_string().repeat(self.width - 2),
            self.chars.tee_right
        ));
        self
    }

    /// Closes the widget and returns its lines.
    pub fn finish(mut self) -> Vec<String> {
        self.lines.push(format!(
            "{}{}{}",
            self.chars.bottom_left,
            self.chars.horizontal.to_string().repeat(self.width - 2),
            self.chars.bottom_right
        ));
        self.lines
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

// ============================================================================
// Widgets
// ============================================================================

/// Settings shared by every widget.
#[derive(Debug, Clone, Copy)]
pub struct WidgetOptions {
    /// Outer width.
    pub width: usize,
    /// Border style.
    pub style: WidgetStyle,
    /// Display currency.
    pub currency: Currency,
}

/// One usage bar row: `label  ████░░░  42% (1h 5m)`.
pub fn limit_row(
    fmt: &TextFormatter,
    label: &str,
    utilization: f64,
    resets_at: Option<DateTime<Utc>>,
    inner_width: usize,
    now: DateTime<Utc>,
) -> String {
    let bar_width = inner_width
        .saturating_sub(LABEL_WIDTH + 1 + 1 + 4 + 1 + RESET_WIDTH)
        .max(5);
    let bar = fmt.progress_bar(utilization, bar_width);
    let pct = format!("{:>4}", format!("{utilization:.0}%"));
    let reset = resets_at
        .map(|r| fmt.dim(&format!("({})", format_time_until(r, now))))
        .unwrap_or_default();
    format!("{label:<width$} {bar} {pct} {reset}", width = LABEL_WIDTH)
}

/// Rate-limit widget: profile, windows and last update.
pub fn rate_limits_widget(
    state: &MonitorState<RateLimitSnapshot>,
    opts: WidgetOptions,
    fmt: &TextFormatter,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut widget = Widget::new("Claude Rate Limits", opts.width, opts.style, fmt);
    let inner = widget.inner_width();
    let payload = state.payload.as_ref();

    if let Some(profile) = payload.and_then(|p| p.profile.as_ref()) {
        let account = &profile.account;
        let name = account
            .display_name
            .as_deref()
            .or(account.full_name.as_deref())
            .or(account.email.as_deref())
            .unwrap_or("-");
        widget.row(&format!("{} {}", fmt.dim("User:"), truncate(name, inner.saturating_sub(6))));

        if let Some(org) = &profile.organization {
            widget.row(&format!("{}  {}", fmt.dim("Org:"), truncate(&org.name, inner.saturating_sub(6))));
        }
        let badge = if profile
            .organization
            .as_ref()
            .and_then(|o| o.organization_type.as_deref())
            == Some("claude_enterprise")
        {
            fmt.cyan("ENTERPRISE")
        } else if account.has_claude_max {
            fmt.magenta("MAX")
        } else if account.has_claude_pro {
            fmt.green("PRO")
        } else {
            String::new()
        };
        if !badge.is_empty() {
            widget.row(&format!("{} {badge}", fmt.dim("Plan:")));
        }
        widget.divider();
    }

    match payload.and_then(|p| p.rate_limits.as_ref()) {
        Some(limits) => {
            let windows = limits.labeled_windows();
            if windows.is_empty() {
                widget.row(&fmt.green("No active rate limits"));
            }
            for (label, window) in windows {
                widget.row(&limit_row(
                    fmt,
                    label,
                    window.clamped_utilization(),
                    window.resets_at,
                    inner,
                    now,
                ));
            }
        }
        None => match &state.last_error {
            Some(error) => {
                widget.row(&fmt.red(&truncate(error, inner)));
            }
            None => {
                widget.row(&fmt.dim("Loading..."));
            }
        },
    }

    if let Some(last_fetch) = state.last_fetch {
        widget.divider();
        widget.row(&fmt.dim(&format!("Updated: {}", local_time(last_fetch))));
    }

    widget.finish()
}

/// Month-to-date Admin API usage widget.
pub fn cost_widget(
    state: &MonitorState<UsageSummary>,
    opts: WidgetOptions,
    fmt: &TextFormatter,
) -> Vec<String> {
    let mut widget = Widget::new("API Usage (This Month)", opts.width, opts.style, fmt);

    match &state.payload {
        Some(usage) => {
            widget.row(&format!(
                "Input:  {} tokens",
                fmt.cyan(&format_tokens(usage.total_input_tokens))
            ));
            widget.row(&format!(
                "Output: {} tokens",
                fmt.cyan(&format_tokens(usage.total_output_tokens))
            ));
            widget.divider();
            widget.row(&format!(
                "Cost:   {}",
                fmt.green(&format_cost(usage.total_cost, opts.currency))
            ));
            widget.divider();
            widget.row(&fmt.dim(&format!("Updated: {}", local_time(usage.last_updated))));
        }
        None => {
            widget.row(&fmt.dim("No data available"));
            if let Some(error) = &state.last_error {
                widget.row(&fmt.red(&truncate(error, widget.inner_width())));
            }
            widget.row("");
            widget.row("Configure ANTHROPIC_ADMIN_API_KEY");
            widget.row("to enable usage tracking.");
        }
    }

    widget.finish()
}

/// Status line under the dashboard.
pub fn status_bar(
    fmt: &TextFormatter,
    running: bool,
    last_error: Option<&str>,
    refresh_interval: u64,
) -> String {
    let status = if running {
        fmt.green("● Running")
    } else {
        fmt.dim("○ Stopped")
    };
    let error = last_error
        .map(|e| fmt.red(&format!(" | Error: {}", truncate(e, 30))))
        .unwrap_or_default();
    format!("{status} | Refresh: {refresh_interval}s{error}")
}
