//! Citation reconciliation.
//!
//! Generated narratives end with a sources section whose bullets carry
//! `[REF-n]` markers. The reconciler scans the text line by line, finds that
//! section and maps every bullet back to the evidence item it cites.
//!
//! Resolution order per bullet:
//! 1. an in-range `[REF-n]` marker resolves to `items[n - 1]`;
//! 2. otherwise the k-th bullet maps to `items[k]` (positional fallback);
//! 3. otherwise the bullet is kept unresolved.
//!
//! The positional fallback assumes the generator listed sources in the order
//! they were supplied. That holds for well-behaved answers only.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::types::{EvidenceItem, ReconciledBullet};

/// Longest line (in words) still accepted as a header.
const MAX_HEADER_WORDS: usize = 6;

const BULLET_GLYPHS: &[char] = &['-', '*', '•', '‣', '–', '·'];

/// Characters stripped from both ends of a candidate header line.
const HEADER_DECORATION: &[char] = &['#', '*', '_', ':', '=', '-', '[', ']', ' '];

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[\s*REF-(\d+)\s*\]").expect("valid marker regex"))
}

/// Header labels as whole words; "Natural resources" is not a header.
fn header_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(sources|references|citations|bibliography)\b").expect("valid header regex")
    })
}

// ============================================================================
// Line classification
// ============================================================================

/// Scanner state over the generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationState {
    BeforeCitations,
    InCitations,
    Done,
}

/// True when `line` reads as a citations-section header.
pub fn is_citation_header(line: &str) -> bool {
    let stripped = line.trim().trim_matches(HEADER_DECORATION).to_lowercase();
    if stripped.is_empty() || stripped.split_whitespace().count() > MAX_HEADER_WORDS {
        return false;
    }
    header_label_regex().is_match(&stripped)
}

/// The bullet body without its glyph, if `line` starts with one.
fn strip_glyph(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    if !BULLET_GLYPHS.contains(&first) {
        return None;
    }
    let rest = chars.as_str();
    // "**Bold**" or "-5%" are not bullets.
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn has_marker(line: &str) -> bool {
    marker_regex().is_match(line)
}

/// Ordinals of all markers in `text`, in order of appearance.
fn marker_ordinals(text: &str) -> Vec<usize> {
    marker_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect()
}

/// Remove markers and tidy the spacing they leave behind.
pub fn strip_markers(text: &str) -> String {
    let without = marker_regex().replace_all(text, "");
    let collapsed = without.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace(" .", ".")
        .replace(" ,", ",")
        .trim()
        .to_string()
}

// ============================================================================
// Reconciliation
// ============================================================================

fn resolve_bullet(line: &str, position: usize, items: &[EvidenceItem]) -> ReconciledBullet {
    let body = strip_glyph(line).unwrap_or(line.trim());
    let display_text = strip_markers(body);

    let by_marker = marker_ordinals(body)
        .into_iter()
        .find(|n| (1..=items.len()).contains(n))
        .map(|n| &items[n - 1]);
    let item = by_marker.or_else(|| items.get(position));

    ReconciledBullet {
        display_text,
        resolved_url: item.and_then(|i| i.url.clone()),
        source_ordinal: item.map(|i| i.ordinal),
    }
}

/// Map the sources bullets of `generated` back to `items`.
///
/// Never fails and never drops or reorders a bullet.
pub fn reconcile(generated: &str, items: &[EvidenceItem]) -> Vec<ReconciledBullet> {
    let mut state = CitationState::BeforeCitations;
    let mut bullets = Vec::new();

    for line in generated.lines() {
        match state {
            CitationState::BeforeCitations => {
                if is_citation_header(line) {
                    state = CitationState::InCitations;
                }
            }
            CitationState::InCitations => {
                if line.trim().is_empty() {
                    continue;
                }
                if strip_glyph(line).is_some() || has_marker(line) {
                    let position = bullets.len();
                    bullets.push(resolve_bullet(line, position, items));
                } else if !bullets.is_empty() {
                    state = CitationState::Done;
                }
            }
            CitationState::Done => break,
        }
    }

    let resolved = bullets.iter().filter(|b| b.source_ordinal.is_some()).count();
    tracing::debug!(
        bullets = bullets.len(),
        resolved,
        items = items.len(),
        "Citations reconciled"
    );
    bullets
}

/// The narrative before the citations section, with inline markers removed.
pub fn narrative_body(generated: &str) -> String {
    let mut body = Vec::new();
    for line in generated.lines() {
        if is_citation_header(line) {
            break;
        }
        body.push(if has_marker(line) {
            strip_markers(line)
        } else {
            line.trim_end().to_string()
        });
    }
    body.join("\n").trim().to_string()
}
