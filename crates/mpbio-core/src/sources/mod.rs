//! External data sources.
//!
//! Each upstream dependency is a trait so the components can be exercised
//! against in-memory fakes. The HTTP implementations live in the submodules:
//!
//! - [`parliament`]: roster search, positions and synopsis (Members API)
//! - [`wikipedia`]: encyclopedia pages and roster-derived links (MediaWiki)
//! - [`hansard`]: spoken contribution search and URL lookup
//! - [`anthropic`]: generative text service
//!
//! Responses are decoded into typed, partially-optional structures; every
//! "field absent" case is handled in the adapter, never downstream.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::SourceError;
use crate::types::{DateWindow, EntityCandidate, SourceType};

pub mod anthropic;
pub mod hansard;
pub mod parliament;
pub mod wikipedia;

#[cfg(test)]
pub(crate) mod fake;

pub use anthropic::AnthropicClient;
pub use hansard::HansardArchive;
pub use parliament::MembersApi;
pub use wikipedia::Wikipedia;

// ============================================================================
// Roster
// ============================================================================

/// Name search against the live roster.
pub trait RosterSource {
    /// Candidates whose name matches `name`, at most `limit` of them.
    fn search_members(&self, name: &str, limit: usize) -> Result<Vec<EntityCandidate>, SourceError>;
}

// ============================================================================
// Positions
// ============================================================================

/// Kind of a structured position record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionKind {
    GovernmentPost,
    OppositionPost,
    OtherPost,
    Committee,
}

impl PositionKind {
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::Committee => SourceType::Committee,
            _ => SourceType::Role,
        }
    }
}

/// A named position with optional dates. No end date means current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub name: String,
    pub kind: PositionKind,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PositionRecord {
    pub fn is_current(&self) -> bool {
        self.end_date.is_none()
    }
}

/// Structured career data for a roster member.
pub trait PositionSource {
    fn fetch_positions(&self, member_id: u32) -> Result<Vec<PositionRecord>, SourceError>;

    /// Official synopsis as plain text, if the roster publishes one.
    fn fetch_synopsis(&self, member_id: u32) -> Result<Option<String>, SourceError>;

    /// Public page listing the member's career, used as the evidence URL.
    fn profile_url(&self, _member_id: u32) -> Option<String> {
        None
    }
}

// ============================================================================
// Encyclopedia
// ============================================================================

/// A titled section of an encyclopedia page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSection {
    pub title: String,
    pub text: String,
}

/// A fetched encyclopedia page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncyclopediaPage {
    pub title: String,
    pub url: String,
    /// Full rendered text (infobox included) used for verification.
    pub rendered_text: String,
    /// Lead summary before the first section.
    pub lead: String,
    /// Top-level sections in source order.
    pub sections: Vec<PageSection>,
}

impl EncyclopediaPage {
    /// URL pointing at a section anchor.
    pub fn section_url(&self, section_title: &str) -> String {
        format!("{}#{}", self.url, section_title.trim().replace(' ', "_"))
    }
}

pub trait EncyclopediaSource {
    fn page_exists(&self, title: &str) -> Result<bool, SourceError>;

    fn fetch_page(&self, title: &str) -> Result<EncyclopediaPage, SourceError>;

    /// Page titles linked from the roster list page.
    fn roster_links(&self) -> Result<Vec<String>, SourceError>;
}

// ============================================================================
// Legislative archive
// ============================================================================

/// One archive search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveQuery<'a> {
    pub member_id: u32,
    pub phrase: &'a str,
    pub window: DateWindow,
    pub take: usize,
}

/// A raw search hit; every field may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveHit {
    pub external_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub debate_title: Option<String>,
    pub short_text: Option<String>,
    pub full_text: Option<String>,
}

pub trait ArchiveSource {
    fn search_contributions(&self, query: &ArchiveQuery<'_>) -> Result<Vec<ArchiveHit>, SourceError>;

    /// Raw path (relative or absolute) of the contribution's web page.
    fn contribution_path(&self, external_id: &str) -> Result<String, SourceError>;
}

// ============================================================================
// Generative text
// ============================================================================

/// What a generation call is for; adapters may pick timeouts per purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPurpose {
    TopicExpansion,
    Narrative,
}

/// A single-turn generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub purpose: GenerationPurpose,
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Opaque text-generation service.
pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, SourceError>;
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse an API date such as `2024-07-05T00:00:00` or `2024-07-05`.
pub(crate) fn parse_api_date(value: &str) -> Option<NaiveDate> {
    let day = value.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
