//! # mpbio CLI
//!
//! Resolves a name to a sitting MP, gathers verified evidence from the
//! parliamentary roster, the encyclopedia and the Hansard archive, and
//! drafts a cited biography. Run `mpbio --help` for usage.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
