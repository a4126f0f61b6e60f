//! MediaWiki (Wikipedia) adapter.
//!
//! Pages are fetched with `action=parse`, converted to Markdown with htmd and
//! split into a lead and top-level (`## `) sections.

use serde::Deserialize;

use mpbio_utils::{html_to_markdown, markdown_to_plain, HttpClient};

use super::{EncyclopediaPage, EncyclopediaSource, PageSection};
use crate::config::EncyclopediaConfig;
use crate::errors::SourceError;

#[derive(Debug, Clone)]
pub struct Wikipedia {
    http: HttpClient,
    config: EncyclopediaConfig,
}

impl Wikipedia {
    pub fn new(http: HttpClient, config: EncyclopediaConfig) -> Self {
        Self { http, config }
    }

    fn page_url(&self, title: &str) -> String {
        format!("{}{}", self.config.page_url, title.trim().replace(' ', "_"))
    }

    fn parse(&self, title: &str, prop: &str) -> Result<ParseValue, SourceError> {
        let response: ParseResponse = self.http.get_json(
            &self.config.api_url,
            &[
                ("action", "parse".to_string()),
                ("page", title.to_string()),
                ("prop", prop.to_string()),
                ("redirects", "1".to_string()),
                ("disableeditsection", "1".to_string()),
                ("format", "json".to_string()),
                ("formatversion", "2".to_string()),
            ],
        )?;

        if let Some(error) = response.error {
            return Err(if error.code.as_deref() == Some("missingtitle") {
                SourceError::NotFound(format!("page `{}`", title))
            } else {
                SourceError::Malformed(error.info.unwrap_or_else(|| "unknown API error".into()))
            });
        }
        response
            .parse
            .ok_or_else(|| SourceError::Malformed(format!("no parse result for `{}`", title)))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryValue>,
}

#[derive(Debug, Deserialize)]
struct QueryValue {
    #[serde(default)]
    pages: Vec<QueryPage>,
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParseValue>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParseValue {
    title: Option<String>,
    text: Option<String>,
    #[serde(default)]
    links: Vec<LinkValue>,
}

#[derive(Debug, Deserialize)]
struct LinkValue {
    ns: Option<i32>,
    title: Option<String>,
    #[serde(default)]
    exists: bool,
}

// ============================================================================
// Section splitting
// ============================================================================

/// Split plain text with `#` heading markers into (lead, sections).
///
/// Only level-2 headings open a new section; deeper headings stay inside
/// their parent with the markers removed. Table rows (`|`) are dropped from
/// lead and sections.
pub(crate) fn split_sections(plain: &str) -> (String, Vec<PageSection>) {
    let mut lead: Vec<&str> = Vec::new();
    let mut sections: Vec<(String, Vec<String>)> = Vec::new();

    for line in plain.lines() {
        let trimmed = line.trim();
        if let Some(title) = trimmed.strip_prefix("## ") {
            sections.push((title.trim().to_string(), Vec::new()));
            continue;
        }
        if trimmed.starts_with('|') {
            continue;
        }
        let content = strip_heading_marker(trimmed);
        match sections.last_mut() {
            Some((_, body)) => body.push(content.to_string()),
            None => lead.push(content),
        }
    }

    let sections = sections
        .into_iter()
        .map(|(title, body)| PageSection {
            title,
            text: collapse_blank_lines(&body.join("\n")),
        })
        .collect();

    (collapse_blank_lines(&lead.join("\n")), sections)
}

fn strip_heading_marker(line: &str) -> &str {
    if line.starts_with('#') {
        line.trim_start_matches('#').trim()
    } else {
        line
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() && out.last().map_or(true, |l| l.trim().is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    out.join("\n")
}

// ============================================================================
// Trait implementation
// ============================================================================

impl EncyclopediaSource for Wikipedia {
    fn page_exists(&self, title: &str) -> Result<bool, SourceError> {
        let response: QueryResponse = self.http.get_json(
            &self.config.api_url,
            &[
                ("action", "query".to_string()),
                ("titles", title.to_string()),
                ("redirects", "1".to_string()),
                ("format", "json".to_string()),
                ("formatversion", "2".to_string()),
            ],
        )?;

        let exists = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .is_some_and(|page| !page.missing && !page.invalid);
        tracing::debug!(title, exists, "Encyclopedia existence check");
        Ok(exists)
    }

    fn fetch_page(&self, title: &str) -> Result<EncyclopediaPage, SourceError> {
        let parsed = self.parse(title, "text")?;
        let html = parsed
            .text
            .ok_or_else(|| SourceError::Malformed(format!("page `{}` has no text", title)))?;

        let plain = markdown_to_plain(&html_to_markdown(&html)?);
        let (lead, sections) = split_sections(&plain);
        let resolved_title = parsed.title.unwrap_or_else(|| title.to_string());

        Ok(EncyclopediaPage {
            url: self.page_url(&resolved_title),
            title: resolved_title,
            rendered_text: plain,
            lead,
            sections,
        })
    }

    fn roster_links(&self) -> Result<Vec<String>, SourceError> {
        let parsed = self.parse(&self.config.roster_list_title, "links")?;
        Ok(parsed
            .links
            .into_iter()
            .filter(|l| l.ns == Some(0) && l.exists)
            .filter_map(|l| l.title)
            .collect())
    }
}
