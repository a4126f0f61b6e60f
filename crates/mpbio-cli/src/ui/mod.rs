//! # CLI UI Module
//!
//! Styling and formatting layer for mpbio output. Results go to stdout,
//! logs and spinners to stderr, and `--json` switches every command to
//! machine-readable output with no decoration.
//!
//! - `color`: color mode detection and terminal width
//! - `style`: message prefixes and styling
//! - `format`: small text formatters
//! - `table`: comfy-table renderers
//! - `progress`: spinners for the slow phases

pub mod color;
pub mod format;
pub mod progress;
pub mod style;
pub mod table;

pub use color::ColorMode;
pub use progress::{Progress, ProgressMode};
pub use style::{MessageType, Style};
