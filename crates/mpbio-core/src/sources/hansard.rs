//! Hansard archive adapter.
//!
//! Spoken contributions are searched with
//! `GET /search/contributions/Spoken.json`; the opaque contribution id is
//! turned into a web path through the contribution URL lookup.

use serde::Deserialize;

use mpbio_utils::HttpClient;

use super::{parse_api_date, ArchiveHit, ArchiveQuery, ArchiveSource};
use crate::config::ArchiveConfig;
use crate::errors::SourceError;

#[derive(Debug, Clone)]
pub struct HansardArchive {
    http: HttpClient,
    config: ArchiveConfig,
}

impl HansardArchive {
    pub fn new(http: HttpClient, config: ArchiveConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Public web host, used by callers to absolutize contribution paths.
    pub fn web_url(&self) -> &str {
        &self.config.web_url
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ContributionValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContributionValue {
    contribution_ext_id: Option<String>,
    sitting_date: Option<String>,
    debate_section: Option<String>,
    contribution_text: Option<String>,
    contribution_text_full: Option<String>,
}

impl From<ContributionValue> for ArchiveHit {
    fn from(value: ContributionValue) -> Self {
        ArchiveHit {
            external_id: value.contribution_ext_id.filter(|id| !id.trim().is_empty()),
            date: value.sitting_date.as_deref().and_then(parse_api_date),
            debate_title: value.debate_section,
            short_text: value.contribution_text,
            full_text: value.contribution_text_full,
        }
    }
}

/// The lookup answers with a bare JSON string, or plain text on some hosts.
fn parse_lookup_body(body: &str) -> Result<String, SourceError> {
    let path = match serde_json::from_str::<String>(body) {
        Ok(s) => s,
        Err(_) => body.trim().trim_matches('"').to_string(),
    };
    let path = path.trim().to_string();
    if path.is_empty() {
        return Err(SourceError::Malformed("empty contribution URL".to_string()));
    }
    Ok(path)
}

// ============================================================================
// Trait implementation
// ============================================================================

impl ArchiveSource for HansardArchive {
    fn search_contributions(&self, query: &ArchiveQuery<'_>) -> Result<Vec<ArchiveHit>, SourceError> {
        let response: SearchResponse = self.http.get_json(
            &self.url("/search/contributions/Spoken.json"),
            &[
                ("queryParameters.memberId", query.member_id.to_string()),
                ("queryParameters.searchTerm", query.phrase.to_string()),
                ("queryParameters.startDate", query.window.start.to_string()),
                ("queryParameters.endDate", query.window.end.to_string()),
                ("queryParameters.take", query.take.to_string()),
                ("queryParameters.orderBy", "SittingDateDesc".to_string()),
            ],
        )?;

        let hits: Vec<ArchiveHit> = response.results.into_iter().map(ArchiveHit::from).collect();
        tracing::debug!(phrase = query.phrase, count = hits.len(), "Archive search returned");
        Ok(hits)
    }

    fn contribution_path(&self, external_id: &str) -> Result<String, SourceError> {
        let path = self.config.contribution_url_path.replace("{id}", external_id);
        let body = self.http.get_text(&self.url(&path), &[])?;
        parse_lookup_body(&body)
    }
}
