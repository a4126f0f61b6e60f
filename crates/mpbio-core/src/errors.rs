//! Error types for mpbio-core.

use thiserror::Error;

use mpbio_utils::UtilsError;

use crate::cancel::Checkpoint;
use crate::types::ScoredCandidate;

/// Domain-specific errors for mpbio operations.
#[derive(Error, Debug)]
pub enum BioError {
    /// The entity (or page) does not exist.
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// Evidence failed a trust check (e.g. constituency mismatch).
    #[error("Evidence from {source_name} failed verification: {reason}")]
    Unverified {
        /// The evidence source.
        source_name: String,
        /// Why verification failed.
        reason: String,
    },

    /// A dependency timed out or answered with a non-2xx status.
    #[error("{source_name} is unavailable: {reason}")]
    Unavailable {
        /// The dependency that failed.
        source_name: String,
        /// Description of the failure.
        reason: String,
    },

    /// Some units of work succeeded and others did not.
    #[error("Partial result: {failed} of {attempted} {unit} failed")]
    PartialResult {
        /// Kind of work unit (phrases, sections, ...).
        unit: String,
        /// Units attempted.
        attempted: usize,
        /// Units that failed.
        failed: usize,
    },

    /// The resolver found several plausible candidates.
    ///
    /// Halts the pipeline before aggregation; the caller must pick one.
    #[error("`{query}` matches several members: {}", format_suggestions(.suggestions))]
    Ambiguous {
        /// The original query.
        query: String,
        /// Ranked candidates to choose from.
        suggestions: Vec<ScoredCandidate>,
    },

    /// Global configuration file is invalid.
    #[error("Global config invalid: {0}")]
    InvalidGlobalConfig(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    /// Invalid argument provided to an operation.
    #[error("{0}")]
    InvalidArgument(String),

    /// The run was cancelled at a checkpoint.
    #[error("Cancelled before {0}")]
    Cancelled(Checkpoint),

    /// The narrative generation call failed.
    #[error("Narrative generation failed: {0}")]
    Generation(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_suggestions(suggestions: &[ScoredCandidate]) -> String {
    suggestions
        .iter()
        .map(|s| {
            format!(
                "{} ({}, {})",
                s.candidate.display_name,
                s.candidate.party_label(),
                s.candidate.constituency_label()
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of a single external data source call.
///
/// Components fold these into per-source statuses; they never abort a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The requested record or page does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Timeout, transport failure or non-2xx status.
    #[error("{0}")]
    Unavailable(String),

    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<UtilsError> for SourceError {
    fn from(err: UtilsError) -> Self {
        match err {
            e if e.is_not_found() => SourceError::NotFound(e.to_string()),
            e @ (UtilsError::Decode { .. }
            | UtilsError::ExtractionError(_)
            | UtilsError::EmptyContent
            | UtilsError::InvalidUrl(_)) => SourceError::Malformed(e.to_string()),
            e => SourceError::Unavailable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chamber, EntityCandidate};

    #[test]
    fn test_utils_error_mapping() {
        let not_found: SourceError = UtilsError::Status {
            url: "u".into(),
            status: 404,
        }
        .into();
        assert!(matches!(not_found, SourceError::NotFound(_)));

        let unavailable: SourceError = UtilsError::Status {
            url: "u".into(),
            status: 503,
        }
        .into();
        assert!(matches!(unavailable, SourceError::Unavailable(_)));

        let timeout: SourceError = UtilsError::Timeout { url: "u".into() }.into();
        assert!(matches!(timeout, SourceError::Unavailable(_)));

        let malformed: SourceError = UtilsError::Decode {
            url: "u".into(),
            message: "eof".into(),
        }
        .into();
        assert!(matches!(malformed, SourceError::Malformed(_)));
    }

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = BioError::Ambiguous {
            query: "Smith".into(),
            suggestions: vec![ScoredCandidate {
                candidate: EntityCandidate {
                    id: 1,
                    display_name: "Jane Smith".into(),
                    party: Some("Labour".into()),
                    constituency: Some("Anytown".into()),
                    chamber: Chamber::Commons,
                    current: true,
                },
                similarity: 0.95,
            }],
        };
        let message = err.to_string();
        assert!(message.contains("`Smith` matches several members"));
        assert!(message.contains("Jane Smith (Labour, Anytown)"));
    }
}
