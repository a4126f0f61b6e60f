//! Message styling for CLI output.
//!
//! | Prefix | Meaning | Color |
//! |--------|---------|-------|
//! | `[ok]` | Success | Green |
//! | `[err]` | Error | Red |
//! | `[warn]` | Warning or degraded source | Yellow |
//! | `[info]` | Information | Blue |
//! | `[hint]` | Next step | Cyan |

use owo_colors::OwoColorize;

use mpbio_core::SourceStatus;

use super::color::ColorMode;

/// Message severity for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Ok,
    Err,
    Warn,
    Info,
    Hint,
}

impl MessageType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::Info => "[info]",
            Self::Hint => "[hint]",
        }
    }
}

/// Styling for every line mpbio prints.
///
/// # Example
///
/// ```ignore
/// use mpbio_cli::ui::{Style, MessageType, ColorMode};
///
/// let style = Style::new(ColorMode::Never);
/// assert_eq!(style.message(MessageType::Ok, "Resolved"), "[ok] Resolved");
/// ```
#[derive(Debug, Clone)]
pub struct Style {
    color_mode: ColorMode,
}

impl Style {
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    pub fn colors_enabled(&self) -> bool {
        self.color_mode.is_enabled()
    }

    /// A message with a type prefix.
    pub fn message(&self, msg_type: MessageType, text: &str) -> String {
        let prefix = msg_type.prefix();
        if self.colors_enabled() {
            let colored_prefix = match msg_type {
                MessageType::Ok => prefix.green().to_string(),
                MessageType::Err => prefix.red().to_string(),
                MessageType::Warn => prefix.yellow().to_string(),
                MessageType::Info => prefix.blue().to_string(),
                MessageType::Hint => prefix.cyan().to_string(),
            };
            format!("{} {}", colored_prefix, text)
        } else {
            format!("{} {}", prefix, text)
        }
    }

    /// Detail line under a message, indented to align with its text.
    pub fn message_detail(&self, label: &str, value: &str) -> String {
        format!("     {}: {}", label, value)
    }

    pub fn section(&self, title: &str) -> String {
        if self.colors_enabled() {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// An error with optional cause and hint lines.
    pub fn error_with_context(&self, msg: &str, cause: Option<&str>, hint: Option<&str>) -> String {
        let mut output = self.message(MessageType::Err, msg);
        if let Some(cause_text) = cause {
            output.push_str(&format!("\n      Cause: {}", cause_text));
        }
        if let Some(hint_text) = hint {
            output.push_str(&format!("\n      Hint: {}", hint_text));
        }
        output
    }

    /// Similarity score, colored by the band the resolver puts it in.
    pub fn score(&self, value: f64) -> String {
        let formatted = format!("{:.2}", value);
        if !self.colors_enabled() {
            return formatted;
        }
        if value >= 0.95 {
            formatted.green().to_string()
        } else if value >= 0.6 {
            formatted.yellow().to_string()
        } else {
            formatted.red().to_string()
        }
    }

    pub fn url(&self, url: &str) -> String {
        if self.colors_enabled() {
            url.cyan().to_string()
        } else {
            url.to_string()
        }
    }

    /// Per-source status label: green when used, yellow when degraded.
    pub fn source_status(&self, status: &SourceStatus) -> String {
        let text = status.to_string();
        if !self.colors_enabled() {
            return text;
        }
        match status {
            SourceStatus::Used => text.green().to_string(),
            s if s.is_degraded() => text.yellow().to_string(),
            _ => text.dimmed().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_no_color() {
        let style = Style::new(ColorMode::Never);
        assert_eq!(style.message(MessageType::Ok, "Done"), "[ok] Done");
        assert_eq!(style.message(MessageType::Hint, "Try"), "[hint] Try");
    }

    #[test]
    fn test_error_with_context() {
        let style = Style::new(ColorMode::Never);
        let output = style.error_with_context("Search failed", Some("HTTP 503"), Some("Retry later"));
        assert!(output.starts_with("[err] Search failed"));
        assert!(output.contains("Cause: HTTP 503"));
        assert!(output.contains("Hint: Retry later"));
    }

    #[test]
    fn test_score_plain() {
        let style = Style::new(ColorMode::Never);
        assert_eq!(style.score(0.951), "0.95");
        assert_eq!(style.score(1.0), "1.00");
    }

    #[test]
    fn test_source_status_plain() {
        let style = Style::new(ColorMode::Never);
        assert_eq!(style.source_status(&SourceStatus::Used), SourceStatus::Used.to_string());
    }
}
