//! Cooperative cancellation.
//!
//! A run checks its [`CancellationToken`] only at phase boundaries. Work that
//! is already inside a phase (for example the phrase loop of a search) runs to
//! the next checkpoint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::errors::BioError;

/// Phase boundaries at which a run may stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    ResolutionDone,
    AggregationDone,
    SearchDone,
    BeforeGeneration,
    BeforeSave,
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ResolutionDone => "evidence aggregation",
            Self::AggregationDone => "record search",
            Self::SearchDone => "narrative generation",
            Self::BeforeGeneration => "narrative generation",
            Self::BeforeSave => "saving the draft",
        };
        write!(f, "{}", label)
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; honoured at the next checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` if cancellation was requested.
    pub fn checkpoint(&self, at: Checkpoint) -> Result<(), BioError> {
        if self.is_cancelled() {
            tracing::info!(checkpoint = ?at, "Run cancelled");
            return Err(BioError::Cancelled(at));
        }
        Ok(())
    }
}
