//! Formatting helpers for CLI output.

use mpbio_core::DateWindow;

/// Truncate to at most `max_len` characters, ending in `...` when cut.
///
/// ```ignore
/// assert_eq!(truncate_str("hello world", 8), "hello...");
/// ```
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return ".".repeat(max_len);
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{}...", kept)
}

/// Collapse all whitespace (newlines included) into single spaces.
pub fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `3 contributions`, `1 contribution`.
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

pub fn format_window(window: &DateWindow) -> String {
    format!("{} to {}", window.start, window.end)
}
