//! Common types used throughout mpbio.
//!
//! This module contains the data model shared by the resolver, the evidence
//! aggregator, the record search engine and the citation reconciler.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::BioError;

// ============================================================================
// Chamber
// ============================================================================

/// Legislative chamber a roster member sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    /// House of Commons (the primary chamber).
    Commons,
    /// House of Lords.
    Lords,
}

/// The chamber every resolved identity must belong to.
pub const PRIMARY_CHAMBER: Chamber = Chamber::Commons;

impl Chamber {
    /// Map the Members API numeric house id.
    pub fn from_house_id(house: u8) -> Option<Self> {
        match house {
            1 => Some(Self::Commons),
            2 => Some(Self::Lords),
            _ => None,
        }
    }

    /// Numeric house id used by the Members API.
    pub fn house_id(&self) -> u8 {
        match self {
            Self::Commons => 1,
            Self::Lords => 2,
        }
    }
}

impl std::fmt::Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commons => write!(f, "House of Commons"),
            Self::Lords => write!(f, "House of Lords"),
        }
    }
}

// ============================================================================
// Entity candidates
// ============================================================================

/// One roster entry returned by a name search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCandidate {
    /// Roster id, unique within one snapshot.
    pub id: u32,
    /// Name as displayed by the roster (e.g. "Sir Keir Starmer").
    pub display_name: String,
    /// Latest party, if known.
    pub party: Option<String>,
    /// Constituency (Commons) or region.
    pub constituency: Option<String>,
    /// Chamber of the latest membership.
    pub chamber: Chamber,
    /// Whether the membership is currently active.
    pub current: bool,
}

impl EntityCandidate {
    /// Party name or a placeholder for display.
    pub fn party_label(&self) -> &str {
        self.party.as_deref().unwrap_or("Unknown party")
    }

    /// Constituency name or a placeholder for display.
    pub fn constituency_label(&self) -> &str {
        self.constituency.as_deref().unwrap_or("Unknown constituency")
    }
}

/// A candidate together with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub candidate: EntityCandidate,
    pub similarity: f64,
}

/// The single candidate chosen by the resolver.
///
/// Can only be constructed for members of [`PRIMARY_CHAMBER`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedIdentity(EntityCandidate);

impl ResolvedIdentity {
    /// Wrap a candidate, rejecting any chamber other than the primary one.
    pub fn new(candidate: EntityCandidate) -> Result<Self, BioError> {
        if candidate.chamber != PRIMARY_CHAMBER {
            return Err(BioError::InvalidArgument(format!(
                "{} sits in the {}, only {} members can be resolved",
                candidate.display_name, candidate.chamber, PRIMARY_CHAMBER
            )));
        }
        Ok(Self(candidate))
    }

    /// The underlying roster entry.
    pub fn candidate(&self) -> &EntityCandidate {
        &self.0
    }

    pub fn id(&self) -> u32 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.display_name
    }

    pub fn constituency(&self) -> Option<&str> {
        self.0.constituency.as_deref()
    }

    pub fn party(&self) -> Option<&str> {
        self.0.party.as_deref()
    }
}

// ============================================================================
// Evidence
// ============================================================================

/// Provenance of an evidence item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    Role,
    Committee,
    Encyclopedia,
    LegislativeRecord,
    UserSupplied,
    AiResearched,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Committee => "committee",
            Self::Encyclopedia => "encyclopedia",
            Self::LegislativeRecord => "legislative-record",
            Self::UserSupplied => "user-supplied",
            Self::AiResearched => "ai-researched",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provenance-tagged fact that has not yet been handed to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub source_type: SourceType,
    pub text: String,
    pub date: Option<NaiveDate>,
    pub url: Option<String>,
}

impl Evidence {
    pub fn new(source_type: SourceType, text: impl Into<String>) -> Self {
        Self {
            source_type,
            text: text.into(),
            date: None,
            url: None,
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    /// Freeze this evidence with the ordinal it is given in a generation request.
    pub fn into_item(self, ordinal: usize) -> EvidenceItem {
        EvidenceItem {
            source_type: self.source_type,
            text: self.text,
            date: self.date,
            url: self.url,
            ordinal,
        }
    }
}

/// Evidence as handed to the generator, addressed as `[REF-<ordinal>]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub source_type: SourceType,
    pub text: String,
    pub date: Option<NaiveDate>,
    pub url: Option<String>,
    /// 1-based, unique within one generation request.
    pub ordinal: usize,
}

impl EvidenceItem {
    /// The marker the generator is asked to echo for this item.
    pub fn marker(&self) -> String {
        format!("[REF-{}]", self.ordinal)
    }
}

// ============================================================================
// Search
// ============================================================================

/// Search phrases derived from a free-text topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQueryPlan {
    pub original_topic: String,
    /// 1 to 5 short phrases.
    pub expanded_terms: Vec<String>,
}

impl SearchQueryPlan {
    /// Degraded plan searching for the literal topic only.
    pub fn literal(topic: &str) -> Self {
        let topic = topic.trim().to_string();
        Self {
            expanded_terms: vec![topic.clone()],
            original_topic: topic,
        }
    }

    /// True when the plan is the single-term fallback.
    pub fn is_literal(&self) -> bool {
        self.expanded_terms.len() == 1 && self.expanded_terms[0] == self.original_topic
    }
}

/// Inclusive date range for archive searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BioError> {
        if start > end {
            return Err(BioError::InvalidArgument(format!(
                "Search window starts ({}) after it ends ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The trailing `months` ending on `end`.
    pub fn trailing_months(end: NaiveDate, months: u32) -> Self {
        let start = end
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }
}

/// One spoken contribution found in the legislative archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRecord {
    /// Unique after de-duplication.
    pub external_id: String,
    pub date: NaiveDate,
    pub debate_title: String,
    pub short_text: String,
    pub full_text: String,
    /// Absolute URL, or `None` when the id lookup failed.
    pub source_url: Option<String>,
    /// The search phrase that first produced this record.
    pub found_by_term: String,
}

impl ContributionRecord {
    /// Evidence entry for this contribution.
    pub fn to_evidence(&self) -> Evidence {
        let body = if self.short_text.trim().is_empty() {
            self.full_text.trim()
        } else {
            self.short_text.trim()
        };
        Evidence::new(
            SourceType::LegislativeRecord,
            format!("{} ({}): {}", self.debate_title, self.date, body),
        )
        .with_date(Some(self.date))
        .with_url(self.source_url.clone())
    }
}

// ============================================================================
// Reconciled citations
// ============================================================================

/// A citation bullet from generated text, annotated with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledBullet {
    pub display_text: String,
    pub resolved_url: Option<String>,
    pub source_ordinal: Option<usize>,
}

impl ReconciledBullet {
    pub fn is_resolved(&self) -> bool {
        self.resolved_url.is_some()
    }

    /// Split off a single sentence-ending period.
    pub fn split_terminal_period(&self) -> (&str, &str) {
        match self.display_text.strip_suffix('.') {
            Some(body) => (body.trim_end(), "."),
            None => (self.display_text.as_str(), ""),
        }
    }

    /// Render as Markdown with the link placed before the terminal period.
    ///
    /// Unresolved bullets render as their display text.
    pub fn render_linked(&self, label: &str) -> String {
        match &self.resolved_url {
            Some(url) => {
                let (body, period) = self.split_terminal_period();
                format!("{} [{}]({}){}", body, label, url, period)
            }
            None => self.display_text.clone(),
        }
    }
}
