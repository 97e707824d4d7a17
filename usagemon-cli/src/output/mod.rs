//! Output formatting for CLI.

mod json;
mod text;
mod widget;

pub use json::JsonFormatter;
pub use text::TextFormatter;
pub use widget::{WidgetOptions, cost_widget, rate_limits_widget, status_bar};

#[cfg(test)]
pub use widget::visible_width;
