//! In-memory sources for unit tests. Each fake records the calls it receives.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::NaiveDate;

use super::*;
use crate::types::{Chamber, EntityCandidate};

pub(crate) fn member(id: u32, name: &str, party: &str, constituency: &str) -> EntityCandidate {
    EntityCandidate {
        id,
        display_name: name.to_string(),
        party: Some(party.to_string()),
        constituency: Some(constituency.to_string()),
        chamber: Chamber::Commons,
        current: true,
    }
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Roster
// ============================================================================

#[derive(Default)]
pub(crate) struct FakeRoster {
    pub members: Vec<EntityCandidate>,
    pub error: Option<SourceError>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeRoster {
    pub fn with(members: Vec<EntityCandidate>) -> Self {
        Self {
            members,
            ..Default::default()
        }
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl RosterSource for FakeRoster {
    fn search_members(&self, name: &str, limit: usize) -> Result<Vec<EntityCandidate>, SourceError> {
        self.calls.borrow_mut().push(name.to_string());
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(self.members.iter().take(limit).cloned().collect())
    }
}

// ============================================================================
// Positions
// ============================================================================

pub(crate) struct FakePositions {
    pub positions: Result<Vec<PositionRecord>, SourceError>,
    pub synopsis: Result<Option<String>, SourceError>,
}

impl Default for FakePositions {
    fn default() -> Self {
        Self {
            positions: Ok(Vec::new()),
            synopsis: Ok(None),
        }
    }
}

impl PositionSource for FakePositions {
    fn fetch_positions(&self, _member_id: u32) -> Result<Vec<PositionRecord>, SourceError> {
        self.positions.clone()
    }

    fn fetch_synopsis(&self, _member_id: u32) -> Result<Option<String>, SourceError> {
        self.synopsis.clone()
    }

    fn profile_url(&self, member_id: u32) -> Option<String> {
        Some(format!("https://members.example/{}", member_id))
    }
}

pub(crate) fn position(name: &str, kind: PositionKind, end: Option<NaiveDate>) -> PositionRecord {
    PositionRecord {
        name: name.to_string(),
        kind,
        start_date: Some(date(2020, 1, 1)),
        end_date: end,
    }
}

// ============================================================================
// Encyclopedia
// ============================================================================

#[derive(Default)]
pub(crate) struct FakeEncyclopedia {
    pub pages: HashMap<String, EncyclopediaPage>,
    pub links: Vec<String>,
    pub links_error: Option<SourceError>,
    pub fetched: RefCell<Vec<String>>,
}

impl FakeEncyclopedia {
    pub fn add(&mut self, page: EncyclopediaPage) {
        self.pages.insert(page.title.clone(), page);
    }
}

impl EncyclopediaSource for FakeEncyclopedia {
    fn page_exists(&self, title: &str) -> Result<bool, SourceError> {
        Ok(self.pages.contains_key(title))
    }

    fn fetch_page(&self, title: &str) -> Result<EncyclopediaPage, SourceError> {
        self.fetched.borrow_mut().push(title.to_string());
        self.pages
            .get(title)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(title.to_string()))
    }

    fn roster_links(&self) -> Result<Vec<String>, SourceError> {
        match &self.links_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.links.clone()),
        }
    }
}

pub(crate) fn page(title: &str, lead: &str, sections: &[(&str, &str)]) -> EncyclopediaPage {
    let sections: Vec<PageSection> = sections
        .iter()
        .map(|(t, body)| PageSection {
            title: t.to_string(),
            text: body.to_string(),
        })
        .collect();
    let mut rendered = lead.to_string();
    for s in &sections {
        rendered.push_str(&format!("\n## {}\n{}", s.title, s.text));
    }
    EncyclopediaPage {
        title: title.to_string(),
        url: format!("https://wiki.example/{}", title.replace(' ', "_")),
        rendered_text: rendered,
        lead: lead.to_string(),
        sections,
    }
}

// ============================================================================
// Archive
// ============================================================================

#[derive(Default)]
pub(crate) struct FakeArchive {
    pub hits: HashMap<String, Result<Vec<ArchiveHit>, SourceError>>,
    pub paths: HashMap<String, String>,
    pub queries: RefCell<Vec<(String, usize)>>,
}

impl ArchiveSource for FakeArchive {
    fn search_contributions(&self, query: &ArchiveQuery<'_>) -> Result<Vec<ArchiveHit>, SourceError> {
        self.queries
            .borrow_mut()
            .push((query.phrase.to_string(), query.take));
        match self.hits.get(query.phrase) {
            Some(result) => result
                .clone()
                .map(|hits| hits.into_iter().take(query.take).collect()),
            None => Ok(Vec::new()),
        }
    }

    fn contribution_path(&self, external_id: &str) -> Result<String, SourceError> {
        self.paths
            .get(external_id)
            .cloned()
            .ok_or_else(|| SourceError::Unavailable("lookup timed out".to_string()))
    }
}

pub(crate) fn hit(id: &str, on: NaiveDate, text: &str) -> ArchiveHit {
    ArchiveHit {
        external_id: Some(id.to_string()),
        date: Some(on),
        debate_title: Some(format!("Debate {}", id)),
        short_text: Some(text.to_string()),
        full_text: Some(text.to_string()),
    }
}

// ============================================================================
// Generator
// ============================================================================

pub(crate) struct FakeGenerator {
    pub responses: RefCell<Vec<Result<String, SourceError>>>,
    pub requests: RefCell<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    /// Answers are returned in order; the last one repeats.
    pub fn answering(responses: Vec<Result<String, SourceError>>) -> Self {
        Self {
            responses: RefCell::new(responses),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn text(answer: &str) -> Self {
        Self::answering(vec![Ok(answer.to_string())])
    }

    pub fn failing() -> Self {
        Self::answering(vec![Err(SourceError::Unavailable("timed out".to_string()))])
    }
}

impl TextGenerator for FakeGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, SourceError> {
        self.requests.borrow_mut().push(request.clone());
        let mut responses = self.responses.borrow_mut();
        if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses
                .first()
                .cloned()
                .unwrap_or_else(|| Err(SourceError::Unavailable("no answer".to_string())))
        }
    }
}
