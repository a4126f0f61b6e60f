//! Table rendering with comfy-table.
//!
//! | Command | Table |
//! |---------|-------|
//! | `mpbio resolve` (ambiguous) | [`render_suggestions_table`] |
//! | `mpbio evidence` | [`render_sources_table`] |
//! | `mpbio search` | [`render_records_table`], [`render_phrases_table`] |
//! | `mpbio generate` | [`render_citations_table`] |

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};

use mpbio_core::search::PhraseOutcome;
use mpbio_core::{ContributionRecord, ReconciledBullet, ScoredCandidate, SourceOutcome};

use super::color::terminal_width;
use super::format::{one_line, truncate_str};
use super::style::Style;

fn plain_table() -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table
}

/// Width left for the free-text column once the fixed columns are drawn.
fn text_width(fixed: usize) -> usize {
    terminal_width().saturating_sub(fixed).clamp(20, 80)
}

/// Ranked candidates offered when a query is ambiguous.
///
/// ```text
///  ID     NAME          PARTY     CONSTITUENCY     SCORE
///  4514   Keir Starmer  Labour    Holborn and ...   1.00
/// ```
pub fn render_suggestions_table(suggestions: &[ScoredCandidate], style: &Style) -> String {
    if suggestions.is_empty() {
        return String::new();
    }

    let mut table = plain_table();
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("NAME"),
        Cell::new("PARTY"),
        Cell::new("CONSTITUENCY"),
        Cell::new("SCORE").set_alignment(CellAlignment::Right),
    ]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
    ]);

    for s in suggestions {
        let c = &s.candidate;
        table.add_row(vec![
            Cell::new(c.id),
            Cell::new(truncate_str(&c.display_name, 32)),
            Cell::new(truncate_str(c.party_label(), 24)),
            Cell::new(truncate_str(c.constituency_label(), 32)),
            Cell::new(style.score(s.similarity)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

/// Per-source status of an evidence bundle.
pub fn render_sources_table(sources: &[SourceOutcome], style: &Style) -> String {
    let mut table = plain_table();
    table.set_header(vec![Cell::new("SOURCE"), Cell::new("STATUS")]);
    for outcome in sources {
        table.add_row(vec![
            Cell::new(outcome.source),
            Cell::new(style.source_status(&outcome.status)),
        ]);
    }
    table.to_string()
}

/// Contribution records, newest first.
pub fn render_records_table(records: &[ContributionRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let title_width = text_width(50);
    let mut table = plain_table();
    table.set_header(vec![
        Cell::new("DATE"),
        Cell::new("DEBATE"),
        Cell::new("FOUND BY"),
        Cell::new("LINK"),
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(record.date),
            Cell::new(truncate_str(&one_line(&record.debate_title), title_width)),
            Cell::new(truncate_str(&record.found_by_term, 24)),
            Cell::new(if record.source_url.is_some() { "yes" } else { "-" }),
        ]);
    }
    table.to_string()
}

/// Per-phrase diagnostics of a search.
pub fn render_phrases_table(phrases: &[PhraseOutcome]) -> String {
    let mut table = plain_table();
    table.set_header(vec![
        Cell::new("PHRASE"),
        Cell::new("ASKED").set_alignment(CellAlignment::Right),
        Cell::new("GOT").set_alignment(CellAlignment::Right),
        Cell::new("KEPT").set_alignment(CellAlignment::Right),
        Cell::new("ERROR"),
    ]);
    for p in phrases {
        table.add_row(vec![
            Cell::new(truncate_str(&p.phrase, 32)),
            Cell::new(p.requested).set_alignment(CellAlignment::Right),
            Cell::new(p.returned).set_alignment(CellAlignment::Right),
            Cell::new(p.kept).set_alignment(CellAlignment::Right),
            Cell::new(p.error.as_deref().map(|e| truncate_str(e, 40)).unwrap_or_default()),
        ]);
    }
    table.to_string()
}

/// Reconciled citations with the ordinal each one resolved to.
pub fn render_citations_table(citations: &[ReconciledBullet], style: &Style) -> String {
    if citations.is_empty() {
        return String::new();
    }

    let text_width = text_width(60);
    let mut table = plain_table();
    table.set_header(vec![Cell::new("REF"), Cell::new("CITATION"), Cell::new("URL")]);
    for bullet in citations {
        table.add_row(vec![
            Cell::new(
                bullet
                    .source_ordinal
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(truncate_str(&bullet.display_text, text_width)),
            Cell::new(
                bullet
                    .resolved_url
                    .as_deref()
                    .map(|u| style.url(&truncate_str(u, 60)))
                    .unwrap_or_else(|| "unresolved".to_string()),
            ),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::ColorMode;
    use chrono::NaiveDate;
    use mpbio_core::{Chamber, EntityCandidate, SourceStatus};

    fn style() -> Style {
        Style::new(ColorMode::Never)
    }

    #[test]
    fn test_suggestions_table() {
        let suggestions = vec![ScoredCandidate {
            candidate: EntityCandidate {
                id: 4514,
                display_name: "Keir Starmer".into(),
                party: Some("Labour".into()),
                constituency: None,
                chamber: Chamber::Commons,
                current: true,
            },
            similarity: 0.95,
        }];
        let output = render_suggestions_table(&suggestions, &style());
        assert!(output.contains("CONSTITUENCY"));
        assert!(output.contains("4514"));
        assert!(output.contains("Unknown constituency"));
        assert!(output.contains("0.95"));
    }

    #[test]
    fn test_empty_tables() {
        assert!(render_suggestions_table(&[], &style()).is_empty());
        assert!(render_records_table(&[]).is_empty());
        assert!(render_citations_table(&[], &style()).is_empty());
    }

    #[test]
    fn test_records_table() {
        let records = vec![ContributionRecord {
            external_id: "X1".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            debate_title: "Housing\nSupply".into(),
            short_text: String::new(),
            full_text: String::new(),
            source_url: None,
            found_by_term: "social housing".into(),
        }];
        let output = render_records_table(&records);
        assert!(output.contains("2025-03-04"));
        assert!(output.contains("Housing Supply"));
        assert!(output.contains("social housing"));
    }

    #[test]
    fn test_sources_and_citations_tables() {
        let sources = vec![SourceOutcome {
            source: "encyclopedia",
            status: SourceStatus::Unverified("page does not mention Anytown".into()),
        }];
        assert!(render_sources_table(&sources, &style()).contains("encyclopedia"));

        let citations = vec![ReconciledBullet {
            display_text: "Members profile".into(),
            resolved_url: None,
            source_ordinal: None,
        }];
        assert!(render_citations_table(&citations, &style()).contains("unresolved"));
    }
}
