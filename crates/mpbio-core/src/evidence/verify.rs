//! Locating and verifying the encyclopedia page for a resolved member.
//!
//! A page is only trusted when the member's constituency appears in its
//! rendered text. Pages failing that check are never used.

use std::collections::HashSet;

use regex::Regex;

use crate::errors::SourceError;
use crate::resolver::{normalize, strip_honorifics};
use crate::sources::{EncyclopediaPage, EncyclopediaSource};
use crate::types::ResolvedIdentity;

/// Result of the page search.
#[derive(Debug, Clone, PartialEq)]
pub enum PageLookup {
    Verified(EncyclopediaPage),
    /// Pages were found but none mentions the constituency.
    Unverified { rejected: Vec<String> },
    NotFound,
    Unavailable(String),
}

/// Lower-case, treat `&` as `and`, collapse whitespace.
fn fold(text: &str) -> String {
    text.to_lowercase()
        .replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when `constituency` occurs in `text` as whole words, ignoring case
/// and `and`/`&`. "Bath" does not match "Bathgate".
pub fn mentions_constituency(text: &str, constituency: &str) -> bool {
    let needle = fold(constituency);
    if needle.is_empty() {
        return false;
    }
    let pattern = format!(r"(?:^|\W){}(?:\W|$)", regex::escape(&needle));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(&fold(text)),
        Err(err) => {
            tracing::warn!(constituency, error = %err, "Unusable constituency pattern");
            false
        }
    }
}

/// Remove a trailing parenthesised disambiguator: `Jane Doe (politician)`.
fn strip_disambiguator(title: &str) -> &str {
    let title = title.trim();
    match title.rfind(" (") {
        Some(idx) if title.ends_with(')') => title[..idx].trim(),
        _ => title,
    }
}

/// Candidate titles in trial order: matching roster links, then direct forms.
pub fn candidate_titles(identity: &ResolvedIdentity, roster_links: &[String]) -> Vec<String> {
    let name = strip_honorifics(identity.name());
    let key = normalize(&name);

    let mut titles: Vec<String> = roster_links
        .iter()
        .filter(|t| normalize(strip_disambiguator(t)) == key)
        .cloned()
        .collect();

    titles.push(name.clone());
    titles.push(format!("{} (politician)", name));
    titles.push(format!("{} (British politician)", name));
    if let Some(party) = identity.party() {
        titles.push(format!("{} ({} politician)", name, party));
    }

    let mut seen = HashSet::new();
    titles.retain(|t| seen.insert(t.clone()));
    titles
}

/// Find the first candidate page that passes constituency verification.
pub fn find_verified_page(
    source: &dyn EncyclopediaSource,
    identity: &ResolvedIdentity,
) -> PageLookup {
    let Some(constituency) = identity.constituency().filter(|c| !c.trim().is_empty()) else {
        return PageLookup::Unverified {
            rejected: Vec::new(),
        };
    };

    let links = match source.roster_links() {
        Ok(links) => links,
        Err(err) => {
            tracing::warn!(error = %err, "Roster link list unavailable, using direct titles only");
            Vec::new()
        }
    };
    let from_links: HashSet<String> = links.iter().cloned().collect();

    let mut rejected = Vec::new();
    let mut checked_pages = HashSet::new();
    let mut last_error: Option<String> = None;

    for title in candidate_titles(identity, &links) {
        if !from_links.contains(&title) {
            match source.page_exists(&title) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    last_error = Some(err.to_string());
                    continue;
                }
            }
        }

        let page = match source.fetch_page(&title) {
            Ok(page) => page,
            Err(SourceError::NotFound(_)) => continue,
            Err(err) => {
                tracing::debug!(title = %title, error = %err, "Encyclopedia fetch failed");
                last_error = Some(err.to_string());
                continue;
            }
        };
        // Redirects may land several candidates on the same page.
        if !checked_pages.insert(page.title.clone()) {
            continue;
        }

        if mentions_constituency(&page.rendered_text, constituency) {
            tracing::debug!(title = %page.title, "Encyclopedia page verified");
            return PageLookup::Verified(page);
        }
        tracing::warn!(
            title = %page.title,
            constituency,
            "Encyclopedia page rejected: constituency not mentioned"
        );
        rejected.push(page.title);
    }

    match (rejected.is_empty(), last_error) {
        (false, _) => PageLookup::Unverified { rejected },
        (true, Some(err)) => PageLookup::Unavailable(err),
        (true, None) => PageLookup::NotFound,
    }
}
