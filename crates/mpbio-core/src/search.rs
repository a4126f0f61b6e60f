//! Legislative record search.
//!
//! Every phrase of a [`SearchQueryPlan`] becomes one task on an explicit
//! queue, consumed by a single sequential worker. A failing phrase is
//! recorded and skipped; its siblings still run. Hits are filtered, resolved
//! to stable URLs, de-duplicated by id, ranked newest first and capped.

use std::collections::{HashSet, VecDeque};

use chrono::{Local, NaiveDate};
use serde::Serialize;

use mpbio_utils::absolutize;

use crate::config::SearchConfig;
use crate::errors::BioError;
use crate::sources::{ArchiveHit, ArchiveQuery, ArchiveSource};
use crate::types::{ContributionRecord, DateWindow, Evidence, SearchQueryPlan};

// ============================================================================
// Report
// ============================================================================

/// Diagnostics for one phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseOutcome {
    pub phrase: String,
    /// Hits requested from the archive.
    pub requested: usize,
    /// Hits the archive returned.
    pub returned: usize,
    /// Records this phrase added after filtering and de-duplication.
    pub kept: usize,
    pub error: Option<String>,
}

/// Result of a search: the ranked records plus per-phrase diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub plan: SearchQueryPlan,
    pub window: DateWindow,
    pub records: Vec<ContributionRecord>,
    pub phrases: Vec<PhraseOutcome>,
}

impl SearchReport {
    pub fn failed_phrases(&self) -> impl Iterator<Item = &PhraseOutcome> {
        self.phrases.iter().filter(|p| p.error.is_some())
    }

    /// `PartialResult` when any phrase failed.
    pub fn partial_error(&self) -> Option<BioError> {
        let failed = self.failed_phrases().count();
        (failed > 0).then(|| BioError::PartialResult {
            unit: "search phrases".to_string(),
            attempted: self.phrases.len(),
            failed,
        })
    }

    pub fn evidence(&self) -> Vec<Evidence> {
        self.records.iter().map(ContributionRecord::to_evidence).collect()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// One unit of work on the search queue.
#[derive(Debug)]
struct PhraseTask<'p> {
    phrase: &'p str,
    take: usize,
}

pub struct RecordSearchEngine<'a> {
    archive: &'a dyn ArchiveSource,
    web_url: &'a str,
    config: &'a SearchConfig,
}

impl<'a> RecordSearchEngine<'a> {
    /// `web_url` is the archive's public host, used to absolutize paths.
    pub fn new(archive: &'a dyn ArchiveSource, web_url: &'a str, config: &'a SearchConfig) -> Self {
        Self {
            archive,
            web_url,
            config,
        }
    }

    /// The trailing window ending today.
    pub fn default_window(&self) -> DateWindow {
        DateWindow::trailing_months(Local::now().date_naive(), self.config.window_months)
    }

    /// Search contributions by `member_id` for every phrase in `plan`.
    pub fn search(
        &self,
        member_id: u32,
        plan: &SearchQueryPlan,
        window: Option<DateWindow>,
        cap: usize,
    ) -> SearchReport {
        let window = window.unwrap_or_else(|| self.default_window());
        let cap = cap.max(1);
        let phrases: Vec<&str> = if plan.expanded_terms.is_empty() {
            vec![plan.original_topic.as_str()]
        } else {
            plan.expanded_terms.iter().map(String::as_str).collect()
        };

        // Integer share per phrase; shortfalls are not redistributed.
        let take = (cap / phrases.len()).max(1);
        let mut queue: VecDeque<PhraseTask<'_>> = phrases
            .iter()
            .map(|&phrase| PhraseTask { phrase, take })
            .collect();

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut outcomes = Vec::new();

        while let Some(task) = queue.pop_front() {
            let query = ArchiveQuery {
                member_id,
                phrase: task.phrase,
                window,
                take: task.take,
            };
            let mut outcome = PhraseOutcome {
                phrase: task.phrase.to_string(),
                requested: task.take,
                returned: 0,
                kept: 0,
                error: None,
            };

            match self.archive.search_contributions(&query) {
                Ok(hits) => {
                    outcome.returned = hits.len();
                    for hit in hits {
                        if let Some(record) = self.accept(hit, task.phrase, &mut seen) {
                            records.push(record);
                            outcome.kept += 1;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(phrase = task.phrase, error = %err, "Phrase search failed, skipping");
                    outcome.error = Some(err.to_string());
                }
            }
            outcomes.push(outcome);
        }

        // Stable: equal dates keep discovery order.
        records.sort_by(|a: &ContributionRecord, b| b.date.cmp(&a.date));
        records.truncate(cap);

        tracing::info!(
            member_id,
            phrases = outcomes.len(),
            records = records.len(),
            "Record search complete"
        );
        SearchReport {
            plan: plan.clone(),
            window,
            records,
            phrases: outcomes,
        }
    }

    /// Filter one hit and turn it into a record; `None` when discarded.
    fn accept(
        &self,
        hit: ArchiveHit,
        phrase: &str,
        seen: &mut HashSet<String>,
    ) -> Option<ContributionRecord> {
        let external_id = hit.external_id?;
        let date: NaiveDate = hit.date?;

        let short_text = hit.short_text.unwrap_or_default().trim().to_string();
        let full_text = hit.full_text.unwrap_or_default().trim().to_string();
        let significant = full_text.chars().count().max(short_text.chars().count());
        if significant < self.config.min_contribution_chars {
            tracing::debug!(id = %external_id, chars = significant, "Discarding short contribution");
            return None;
        }

        // First occurrence wins.
        if !seen.insert(external_id.clone()) {
            return None;
        }

        let source_url = self.resolve_url(&external_id);
        Some(ContributionRecord {
            external_id,
            date,
            debate_title: hit
                .debate_title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled debate".to_string()),
            short_text,
            full_text,
            source_url,
            found_by_term: phrase.to_string(),
        })
    }

    fn resolve_url(&self, external_id: &str) -> Option<String> {
        let path = match self.archive.contribution_path(external_id) {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!(id = external_id, error = %err, "Contribution URL lookup failed");
                return None;
            }
        };
        absolutize(self.web_url, &path).ok()
    }
}
