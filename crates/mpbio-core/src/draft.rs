//! Biography drafts.
//!
//! A [`BiographyDraft`] is the output of one generation run: the narrative
//! body, the reconciled citations and everything needed to audit them.
//! Drafts are written as pretty JSON; [`BiographyDraft::to_markdown`]
//! gives a readable preview.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::BioError;
use crate::evidence::SourceOutcome;
use crate::types::{EvidenceItem, ReconciledBullet, ResolvedIdentity, SearchQueryPlan};

/// Label used for inline source links in the Markdown preview.
pub const LINK_LABEL: &str = "source";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiographyDraft {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Generator model identifier.
    pub model: String,
    pub member: ResolvedIdentity,
    /// Search plan, when a topic was given.
    pub plan: Option<SearchQueryPlan>,
    /// Narrative without the sources section and inline markers.
    pub narrative: String,
    /// Generator output exactly as received.
    pub generated_text: String,
    pub citations: Vec<ReconciledBullet>,
    /// Items in ordinal order.
    pub evidence: Vec<EvidenceItem>,
    pub sources: Vec<SourceOutcome>,
    /// Search phrases that failed and were skipped.
    pub failed_phrases: Vec<String>,
}

impl BiographyDraft {
    pub fn unresolved_citations(&self) -> usize {
        self.citations.iter().filter(|c| !c.is_resolved()).count()
    }

    /// `<member-slug>-<yyyymmdd-hhmmss>.json`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.json",
            slugify(self.member.name()),
            self.generated_at.format("%Y%m%d-%H%M%S")
        )
    }

    /// Narrative followed by a linked sources list.
    pub fn to_markdown(&self) -> String {
        let mut out = self.narrative.clone();
        if !self.citations.is_empty() {
            out.push_str("\n\n## Sources\n\n");
            for bullet in &self.citations {
                out.push_str("- ");
                out.push_str(&bullet.render_linked(LINK_LABEL));
                out.push('\n');
            }
        }
        out
    }

    /// Write the draft into `dir` and return the file path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, BioError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        tracing::info!(path = %path.display(), run_id = %self.run_id, "Draft saved");
        Ok(path)
    }
}

/// Lowercase ASCII slug; runs of other characters become one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "member".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    use crate::sources::fake::member;

    fn draft() -> BiographyDraft {
        BiographyDraft {
            run_id: Uuid::new_v4(),
            generated_at: Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap(),
            model: "test-model".into(),
            member: ResolvedIdentity::new(member(42, "Dame Jane O'Doe", "Labour", "Anytown")).unwrap(),
            plan: None,
            narrative: "Jane Doe\n\nShe chairs a committee.".into(),
            generated_text: "raw".into(),
            citations: vec![
                ReconciledBullet {
                    display_text: "Members profile.".into(),
                    resolved_url: Some("https://members.example/42".into()),
                    source_ordinal: Some(1),
                },
                ReconciledBullet {
                    display_text: "Unknown".into(),
                    resolved_url: None,
                    source_ordinal: None,
                },
            ],
            evidence: Vec::new(),
            sources: Vec::new(),
            failed_phrases: Vec::new(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Dame Jane O'Doe"), "dame-jane-o-doe");
        assert_eq!(slugify("  Élise  Ng "), "lise-ng");
        assert_eq!(slugify("!!!"), "member");
    }

    #[test]
    fn test_markdown_preview() {
        let md = draft().to_markdown();
        assert!(md.starts_with("Jane Doe\n\nShe chairs a committee."));
        assert!(md.contains("- Members profile [source](https://members.example/42).\n"));
        assert!(md.contains("- Unknown\n"));
        assert_eq!(draft().unresolved_citations(), 1);
    }

    #[test]
    fn test_save_writes_json() {
        let temp = TempDir::new().unwrap();
        let draft = draft();
        let path = draft.save(&temp.path().join("drafts")).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "dame-jane-o-doe-20261019-093000.json"
        );
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["member"]["displayName"], "Dame Jane O'Doe");
        assert_eq!(value["citations"][0]["sourceOrdinal"], 1);
    }
}
