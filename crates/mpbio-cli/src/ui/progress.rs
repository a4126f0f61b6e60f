//! Spinners for the slow pipeline phases.
//!
//! Every phase of a run waits on a remote service, so each gets an
//! indeterminate `indicatif` spinner. Spinners are hidden when stdout is not
//! a TTY, with `--quiet`, and with `--json`.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// How progress feedback is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Animated spinners on a TTY.
    Interactive,
    /// Final messages only.
    Quiet,
    /// Nothing at all (machine-readable output).
    Silent,
}

impl ProgressMode {
    pub fn detect(quiet: bool, json: bool) -> Self {
        if json {
            Self::Silent
        } else if quiet || !std::io::stdout().is_terminal() {
            Self::Quiet
        } else {
            Self::Interactive
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }

    /// Whether status lines (as opposed to results) should be printed.
    pub fn shows_status(&self) -> bool {
        !matches!(self, Self::Silent)
    }
}

/// Spinner tick characters (Braille-based).
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// A spinner for one pipeline phase.
pub struct Progress {
    bar: ProgressBar,
    mode: ProgressMode,
}

impl Progress {
    /// Start a spinner.
    ///
    /// ```ignore
    /// let progress = Progress::spinner("Searching the record...", mode);
    /// let report = engine.search_records(&identity, &plan, None, None);
    /// progress.finish_with_message("[ok] 8 contributions");
    /// ```
    pub fn spinner(message: &str, mode: ProgressMode) -> Self {
        let bar = if mode.is_interactive() {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .tick_chars(SPINNER_CHARS)
                    .template("{spinner:.cyan} {msg} ({elapsed})")
                    .expect("valid template"),
            );
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            ProgressBar::hidden()
        };

        Self { bar, mode }
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Clear the spinner without printing anything.
    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }

    /// Replace the spinner with a final status line.
    pub fn finish_with_message(&self, message: &str) {
        self.bar.finish_and_clear();
        if self.mode.shows_status() && !message.is_empty() {
            println!("{}", message);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.bar.elapsed()
    }
}
