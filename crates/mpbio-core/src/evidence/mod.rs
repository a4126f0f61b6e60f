//! Evidence aggregation for a resolved member.
//!
//! Each sub-source (supplied text, synopsis, positions, encyclopedia)
//! degrades independently. The bundle text always tells the generator what
//! is known and, through explicit sentinels, what must not be stated.

pub mod packing;
pub mod verify;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::EvidenceConfig;
use crate::errors::BioError;
use crate::sources::{EncyclopediaSource, PositionKind, PositionRecord, PositionSource};
use crate::types::{Evidence, ResolvedIdentity, SourceType};

pub use packing::{pack, PackedExcerpt, PackingRules};
pub use verify::{find_verified_page, mentions_constituency, PageLookup};

/// Emitted when positions were fetched but none is current.
pub const NO_CURRENT_POSITIONS: &str = "No current committee memberships or government/opposition roles found. Do not include any such positions in the biography.";

/// Emitted when the position source failed.
pub const NO_POSITION_DATA: &str = "No verified position data available. Do not include any committee memberships, government/opposition roles, or parliamentary activities in the biography.";

// ============================================================================
// Source report
// ============================================================================

/// Per-source outcome of an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SourceStatus {
    /// Contributed evidence.
    Used,
    /// Answered, but with nothing usable.
    Empty,
    /// Nothing to fetch (e.g. no supplied text).
    Skipped,
    NotFound,
    /// Found, but failed verification.
    Unverified(String),
    Unavailable(String),
}

impl SourceStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Unverified(_) | Self::Unavailable(_)
        )
    }

    /// The failure as a domain error, for degraded statuses.
    pub fn to_error(&self, source_name: &str) -> Option<BioError> {
        match self {
            Self::NotFound => Some(BioError::NotFound {
                what: source_name.to_string(),
            }),
            Self::Unverified(reason) => Some(BioError::Unverified {
                source_name: source_name.to_string(),
                reason: reason.clone(),
            }),
            Self::Unavailable(reason) => Some(BioError::Unavailable {
                source_name: source_name.to_string(),
                reason: reason.clone(),
            }),
            Self::Used | Self::Empty | Self::Skipped => None,
        }
    }
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Used => write!(f, "used"),
            Self::Empty => write!(f, "empty"),
            Self::Skipped => write!(f, "skipped"),
            Self::NotFound => write!(f, "not found"),
            Self::Unverified(reason) => write!(f, "unverified ({})", reason),
            Self::Unavailable(reason) => write!(f, "unavailable ({})", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    pub source: &'static str,
    pub status: SourceStatus,
}

// ============================================================================
// Bundle
// ============================================================================

/// Everything gathered about one member, ready for narrative generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceBundle {
    pub identity: ResolvedIdentity,
    /// Free text handed to the generator.
    pub text: String,
    /// Discrete facts, in bundle order, for citation reconciliation.
    pub evidence: Vec<Evidence>,
    pub sources: Vec<SourceOutcome>,
}

impl EvidenceBundle {
    /// True when no source contributed anything.
    pub fn is_empty(&self) -> bool {
        !self.sources.iter().any(|s| s.status == SourceStatus::Used)
    }

    pub fn degraded_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources.iter().filter(|s| s.status.is_degraded())
    }
}

fn no_information_text(name: &str) -> String {
    format!(
        "No information is available for {} from any source. Do not invent biographical details, positions or parliamentary activity.",
        name
    )
}

fn long_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

fn describe_position(position: &PositionRecord) -> String {
    match (position.start_date, position.end_date) {
        (Some(start), None) => format!("{} (since {})", position.name, long_date(start)),
        (Some(start), Some(end)) => format!(
            "{} ({} to {})",
            position.name,
            long_date(start),
            long_date(end)
        ),
        (None, Some(end)) => format!("{} (until {})", position.name, long_date(end)),
        (None, None) => position.name.clone(),
    }
}

// ============================================================================
// EvidenceAggregator
// ============================================================================

pub struct EvidenceAggregator<'a> {
    positions: &'a dyn PositionSource,
    encyclopedia: &'a dyn EncyclopediaSource,
    config: &'a EvidenceConfig,
}

/// Bundle section under construction.
struct Section {
    heading: String,
    body: String,
}

impl<'a> EvidenceAggregator<'a> {
    pub fn new(
        positions: &'a dyn PositionSource,
        encyclopedia: &'a dyn EncyclopediaSource,
        config: &'a EvidenceConfig,
    ) -> Self {
        Self {
            positions,
            encyclopedia,
            config,
        }
    }

    /// Gather evidence for `identity`, optionally with caller-supplied text.
    pub fn aggregate(&self, identity: &ResolvedIdentity, supplied: Option<&str>) -> EvidenceBundle {
        let mut sections = Vec::new();
        let mut evidence = Vec::new();
        let mut sources = Vec::new();

        let supplied = supplied.map(str::trim).filter(|s| !s.is_empty());
        sources.push(SourceOutcome {
            source: "supplied",
            status: match supplied {
                Some(text) => {
                    sections.push(Section {
                        heading: "USER-SUPPLIED INFORMATION".into(),
                        body: text.to_string(),
                    });
                    evidence.push(Evidence::new(SourceType::UserSupplied, text));
                    SourceStatus::Used
                }
                None => SourceStatus::Skipped,
            },
        });

        sources.push(SourceOutcome {
            source: "synopsis",
            status: self.collect_synopsis(identity, &mut sections),
        });
        sources.push(SourceOutcome {
            source: "positions",
            status: self.collect_positions(identity, &mut sections, &mut evidence),
        });
        sources.push(SourceOutcome {
            source: "encyclopedia",
            status: self.collect_encyclopedia(identity, &mut sections, &mut evidence),
        });

        for outcome in sources.iter().filter(|o| o.status.is_degraded()) {
            tracing::warn!(source = outcome.source, status = %outcome.status, "Evidence source degraded");
        }

        let mut bundle = EvidenceBundle {
            identity: identity.clone(),
            text: String::new(),
            evidence,
            sources,
        };
        bundle.text = if bundle.is_empty() {
            no_information_text(identity.name())
        } else {
            sections
                .iter()
                .map(|s| format!("{}:\n{}", s.heading, s.body.trim_end()))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        tracing::info!(
            member = identity.name(),
            items = bundle.evidence.len(),
            chars = bundle.text.chars().count(),
            "Evidence aggregated"
        );
        bundle
    }

    fn collect_synopsis(&self, identity: &ResolvedIdentity, sections: &mut Vec<Section>) -> SourceStatus {
        match self.positions.fetch_synopsis(identity.id()) {
            Ok(Some(text)) if !text.trim().is_empty() => {
                sections.push(Section {
                    heading: "OFFICIAL SYNOPSIS".into(),
                    body: text.trim().to_string(),
                });
                SourceStatus::Used
            }
            Ok(_) => SourceStatus::Empty,
            Err(err) => SourceStatus::Unavailable(err.to_string()),
        }
    }

    fn collect_positions(
        &self,
        identity: &ResolvedIdentity,
        sections: &mut Vec<Section>,
        evidence: &mut Vec<Evidence>,
    ) -> SourceStatus {
        let records = match self.positions.fetch_positions(identity.id()) {
            Ok(records) => records,
            Err(err) => {
                sections.push(Section {
                    heading: "VERIFIED PARLIAMENTARY POSITIONS".into(),
                    body: NO_POSITION_DATA.into(),
                });
                return SourceStatus::Unavailable(err.to_string());
            }
        };

        let url = self.positions.profile_url(identity.id());
        let (current, previous): (Vec<&PositionRecord>, Vec<&PositionRecord>) =
            records.iter().partition(|p| p.is_current());
        let (committees, roles): (Vec<&PositionRecord>, Vec<&PositionRecord>) = current
            .iter()
            .copied()
            .partition(|p| p.kind == PositionKind::Committee);

        let mut body = String::new();
        if current.is_empty() {
            body.push_str(NO_CURRENT_POSITIONS);
            body.push('\n');
        }
        for (label, group) in [
            ("Current government/opposition roles", &roles),
            ("Current committee memberships", &committees),
            ("Previous roles and committee memberships", &previous),
        ] {
            if group.is_empty() {
                continue;
            }
            body.push_str(label);
            body.push_str(":\n");
            for position in group.iter() {
                let line = describe_position(position);
                body.push_str(&format!("- {}\n", line));
                evidence.push(
                    Evidence::new(position.kind.source_type(), line)
                        .with_date(position.start_date)
                        .with_url(url.clone()),
                );
            }
        }

        sections.push(Section {
            heading: "VERIFIED PARLIAMENTARY POSITIONS".into(),
            body,
        });
        if records.is_empty() {
            SourceStatus::Empty
        } else {
            SourceStatus::Used
        }
    }

    fn collect_encyclopedia(
        &self,
        identity: &ResolvedIdentity,
        sections: &mut Vec<Section>,
        evidence: &mut Vec<Evidence>,
    ) -> SourceStatus {
        let page = match find_verified_page(self.encyclopedia, identity) {
            PageLookup::Verified(page) => page,
            PageLookup::Unverified { rejected } if rejected.is_empty() => {
                return SourceStatus::Unverified("member has no constituency to verify against".into())
            }
            PageLookup::Unverified { rejected } => {
                return SourceStatus::Unverified(format!(
                    "{} does not mention {}",
                    rejected.join(", "),
                    identity.constituency().unwrap_or_default()
                ))
            }
            PageLookup::NotFound => return SourceStatus::NotFound,
            PageLookup::Unavailable(reason) => return SourceStatus::Unavailable(reason),
        };

        let rules = PackingRules {
            budget: self.config.excerpt_budget_chars,
            relaxed_fill_ratio: self.config.relaxed_fill_ratio,
            priority: &self.config.priority_sections,
            excluded: &self.config.excluded_sections,
        };
        let excerpt = pack(&page, &rules);
        if excerpt.is_empty() {
            return SourceStatus::Empty;
        }

        for part in &excerpt.parts {
            let (text, url) = match &part.title {
                Some(title) => (format!("{}: {}", title, part.text), page.section_url(title)),
                None => (part.text.clone(), page.url.clone()),
            };
            evidence.push(Evidence::new(SourceType::Encyclopedia, text).with_url(Some(url)));
        }
        sections.push(Section {
            heading: format!("ENCYCLOPEDIA EXCERPT ({})", page.url),
            body: excerpt.text(),
        });
        SourceStatus::Used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;
    use crate::sources::fake::{date, member, page, position, FakeEncyclopedia, FakePositions};

    fn jane() -> ResolvedIdentity {
        ResolvedIdentity::new(member(42, "Jane Doe", "Labour", "Anytown")).unwrap()
    }

    fn verified_wiki() -> FakeEncyclopedia {
        let mut wiki = FakeEncyclopedia::default();
        wiki.add(page(
            "Jane Doe",
            "Jane Doe is the Member of Parliament for Anytown.",
            &[
                ("Early life", "Born in Anytown in 1975."),
                ("References", "1. A source."),
            ],
        ));
        wiki
    }

    #[test]
    fn test_unverified_encyclopedia_is_dropped() {
        let positions = FakePositions {
            positions: Ok(vec![position("Treasury Committee", PositionKind::Committee, None)]),
            synopsis: Ok(None),
        };
        let mut wiki = FakeEncyclopedia::default();
        wiki.add(page("Jane Doe", "Jane Doe is a novelist from Elsewhere.", &[]));
        let config = EvidenceConfig::default();

        let bundle = EvidenceAggregator::new(&positions, &wiki, &config).aggregate(&jane(), None);

        let encyclopedia = bundle
            .sources
            .iter()
            .find(|s| s.source == "encyclopedia")
            .unwrap();
        assert!(matches!(encyclopedia.status, SourceStatus::Unverified(_)));
        assert!(!bundle.text.contains("novelist"));
        assert!(bundle
            .evidence
            .iter()
            .all(|e| e.source_type != SourceType::Encyclopedia));
        assert!(bundle.text.contains("Treasury Committee (since 1 January 2020)"));
        assert!(matches!(
            encyclopedia.status.to_error("encyclopedia"),
            Some(BioError::Unverified { .. })
        ));
    }

    #[test]
    fn test_full_bundle_order_and_items() {
        let positions = FakePositions {
            positions: Ok(vec![
                position("Minister for Housing", PositionKind::GovernmentPost, None),
                position(
                    "Health Committee",
                    PositionKind::Committee,
                    Some(date(2022, 5, 1)),
                ),
            ]),
            synopsis: Ok(Some("Jane Doe was elected in 2019.".into())),
        };
        let wiki = verified_wiki();
        let config = EvidenceConfig::default();

        let bundle = EvidenceAggregator::new(&positions, &wiki, &config)
            .aggregate(&jane(), Some("Notes from the office."));

        let supplied = bundle.text.find("USER-SUPPLIED").unwrap();
        let synopsis = bundle.text.find("OFFICIAL SYNOPSIS").unwrap();
        let roles = bundle.text.find("VERIFIED PARLIAMENTARY POSITIONS").unwrap();
        let wiki_at = bundle.text.find("ENCYCLOPEDIA EXCERPT").unwrap();
        assert!(supplied < synopsis && synopsis < roles && roles < wiki_at);
        assert!(!bundle.text.contains(NO_CURRENT_POSITIONS));
        assert!(bundle.text.contains("Health Committee (1 January 2020 to 1 May 2022)"));
        assert!(!bundle.text.contains("A source."));

        let kinds: Vec<SourceType> = bundle.evidence.iter().map(|e| e.source_type).collect();
        assert_eq!(
            kinds,
            vec![
                SourceType::UserSupplied,
                SourceType::Role,
                SourceType::Committee,
                SourceType::Encyclopedia,
                SourceType::Encyclopedia,
            ]
        );
        assert_eq!(
            bundle.evidence[4].url.as_deref(),
            Some("https://wiki.example/Jane_Doe#Early_life")
        );
        assert_eq!(
            bundle.evidence[1].url.as_deref(),
            Some("https://members.example/42")
        );
    }

    #[test]
    fn test_no_current_positions_sentinel() {
        let positions = FakePositions {
            positions: Ok(vec![position(
                "Whip",
                PositionKind::GovernmentPost,
                Some(date(2021, 1, 1)),
            )]),
            synopsis: Ok(None),
        };
        let config = EvidenceConfig::default();
        let bundle = EvidenceAggregator::new(&positions, &verified_wiki(), &config)
            .aggregate(&jane(), None);
        assert!(bundle.text.contains(NO_CURRENT_POSITIONS));
    }

    #[test]
    fn test_position_failure_sentinel() {
        let positions = FakePositions {
            positions: Err(SourceError::Unavailable("timed out".into())),
            synopsis: Err(SourceError::Unavailable("timed out".into())),
        };
        let config = EvidenceConfig::default();
        let bundle = EvidenceAggregator::new(&positions, &verified_wiki(), &config)
            .aggregate(&jane(), None);
        assert!(bundle.text.contains(NO_POSITION_DATA));
        assert!(bundle.text.contains("ENCYCLOPEDIA EXCERPT"));
        assert_eq!(bundle.degraded_sources().count(), 2);
    }

    #[test]
    fn test_total_failure_gives_no_information_bundle() {
        let positions = FakePositions {
            positions: Err(SourceError::Unavailable("down".into())),
            synopsis: Err(SourceError::Unavailable("down".into())),
        };
        let wiki = FakeEncyclopedia {
            links_error: Some(SourceError::Unavailable("down".into())),
            ..Default::default()
        };
        let config = EvidenceConfig::default();
        let bundle = EvidenceAggregator::new(&positions, &wiki, &config).aggregate(&jane(), None);

        assert!(bundle.is_empty());
        assert!(bundle.text.starts_with("No information is available for Jane Doe"));
        assert!(bundle.evidence.is_empty());
    }

    #[test]
    fn test_excerpt_respects_budget() {
        let positions = FakePositions::default();
        let long = "w".repeat(500);
        let mut wiki = FakeEncyclopedia::default();
        wiki.add(page(
            "Jane Doe",
            "Jane Doe is the MP for Anytown.",
            &[("Career", &long), ("Education", "Anytown School.")],
        ));
        let config = EvidenceConfig {
            excerpt_budget_chars: 120,
            ..Default::default()
        };
        let bundle = EvidenceAggregator::new(&positions, &wiki, &config).aggregate(&jane(), None);

        let excerpt = bundle.text.split("ENCYCLOPEDIA EXCERPT").nth(1).unwrap();
        assert!(!excerpt.contains(&"w".repeat(10)));
        assert!(excerpt.contains("Anytown School."));
    }
}
