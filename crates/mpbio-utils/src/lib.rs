//! Utility functions for mpbio
//!
//! This crate provides the blocking HTTP client used by every data source,
//! HTML to plain-text conversion and URL normalization. It isolates the heavy
//! dependencies (reqwest, htmd) from the domain crate.

use thiserror::Error;

pub mod html;
pub mod http;
pub mod url;

pub use html::{html_to_markdown, html_to_text, markdown_to_plain};
pub use http::{HttpClient, HttpSettings};
pub use url::absolutize;

#[derive(Debug, Error)]
pub enum UtilsError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request to {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to fetch URL: {0}")]
    FetchError(String),

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Failed to extract content: {0}")]
    ExtractionError(String),

    #[error("Invalid URL `{0}`")]
    InvalidUrl(String),

    #[error("Content is empty")]
    EmptyContent,
}

impl UtilsError {
    /// True for HTTP 404 responses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// True for timeouts and transport-level failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::FetchError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = UtilsError::Status {
            url: "https://example.org/x".into(),
            status: 404,
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());

        let err = UtilsError::Timeout {
            url: "https://example.org/x".into(),
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("timed out"));
    }
}
