//! Fuzzy entity resolution against the live roster.
//!
//! A query is normalized (case, periods, whitespace, leading honorifics) and
//! scored against every roster candidate. The resolver auto-selects only when
//! one candidate is a clear winner; otherwise it returns ranked suggestions
//! for the caller to choose from.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use crate::config::ResolverConfig;
use crate::errors::{BioError, SourceError};
use crate::sources::RosterSource;
use crate::types::{EntityCandidate, ResolvedIdentity, ScoredCandidate, PRIMARY_CHAMBER};

/// Leading titles removed during normalization, longest forms first.
const HONORIFICS: &[&str] = &[
    "right honourable",
    "rt hon",
    "the",
    "sir",
    "dame",
    "lord",
    "lady",
    "baroness",
    "baron",
    "professor",
    "prof",
    "dr",
    "mrs",
    "mr",
    "ms",
    "miss",
];

// ============================================================================
// Scoring
// ============================================================================

/// Lower-case, drop periods, collapse whitespace and strip leading honorifics.
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase().replace('.', "");
    let words: Vec<&str> = lowered.split_whitespace().collect();
    words[honorific_prefix_len(&words)..].join(" ")
}

/// Display name without leading honorifics, keeping the original casing.
pub fn strip_honorifics(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let keys: Vec<String> = words
        .iter()
        .map(|w| w.to_lowercase().replace('.', ""))
        .collect();
    words[honorific_prefix_len(&keys)..].join(" ")
}

/// Number of leading words that are honorifics. At least one word is kept so
/// a bare title still normalizes to itself.
fn honorific_prefix_len<S: AsRef<str>>(words: &[S]) -> usize {
    let mut start = 0;
    'strip: loop {
        let rest = &words[start..];
        for honorific in HONORIFICS {
            let parts: Vec<&str> = honorific.split(' ').collect();
            if rest.len() > parts.len()
                && rest.iter().zip(&parts).all(|(w, p)| w.as_ref() == *p)
            {
                start += parts.len();
                continue 'strip;
            }
        }
        return start;
    }
}

/// Similarity of two names in `[0, 1]`.
///
/// 1.0 for equal normalized forms, 0.95 when the query is contained in the
/// name, otherwise the character LCS ratio `2 * lcs / (len_a + len_b)`.
pub fn similarity(query: &str, name: &str) -> f64 {
    let q = normalize(query);
    let n = normalize(name);
    if q.is_empty() || n.is_empty() {
        return 0.0;
    }
    if q == n {
        return 1.0;
    }
    if n.contains(&q) {
        return 0.95;
    }

    let a: Vec<char> = q.chars().collect();
    let b: Vec<char> = n.chars().collect();
    2.0 * lcs_len(&a, &b) as f64 / (a.len() + b.len()) as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

// ============================================================================
// Resolution
// ============================================================================

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum Resolution {
    /// One clear winner.
    Confirmed(ResolvedIdentity),
    /// Ranked candidates; the caller must choose.
    Suggestions(Vec<ScoredCandidate>),
    /// Nothing plausible, with a human-readable reason.
    NoMatch(String),
}

/// Discriminant of a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Confirmed,
    Suggestions,
    NoMatch,
}

impl Resolution {
    pub fn status(&self) -> ResolutionStatus {
        match self {
            Self::Confirmed(_) => ResolutionStatus::Confirmed,
            Self::Suggestions(_) => ResolutionStatus::Suggestions,
            Self::NoMatch(_) => ResolutionStatus::NoMatch,
        }
    }

    /// Convert into the confirmed identity, or the matching error.
    pub fn into_identity(self, query: &str) -> Result<ResolvedIdentity, BioError> {
        match self {
            Self::Confirmed(identity) => Ok(identity),
            Self::Suggestions(suggestions) => Err(BioError::Ambiguous {
                query: query.to_string(),
                suggestions,
            }),
            Self::NoMatch(message) => Err(BioError::NotFound { what: message }),
        }
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Resolution results keyed by `(normalized query, result limit)`.
///
/// Entries never expire; only [`ResolutionCache::clear`] empties the cache.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<(String, usize), Resolution>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, normalized: &str, limit: usize) -> Option<Resolution> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&(normalized.to_string(), limit)).cloned()
    }

    pub fn insert(&self, normalized: &str, limit: usize, resolution: Resolution) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert((normalized.to_string(), limit), resolution);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(entries = entries.len(), "Clearing resolution cache");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// EntityResolver
// ============================================================================

/// Resolves name queries against a roster, memoizing in a shared cache.
pub struct EntityResolver<'a> {
    roster: &'a dyn RosterSource,
    cache: &'a ResolutionCache,
    config: &'a ResolverConfig,
    search_limit: usize,
}

impl<'a> EntityResolver<'a> {
    pub fn new(
        roster: &'a dyn RosterSource,
        cache: &'a ResolutionCache,
        config: &'a ResolverConfig,
        search_limit: usize,
    ) -> Self {
        Self {
            roster,
            cache,
            config,
            search_limit,
        }
    }

    /// Resolve a free-text name query. Never fails: upstream errors become
    /// [`Resolution::NoMatch`].
    pub fn resolve(&self, query: &str) -> Resolution {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return Resolution::NoMatch("Enter a member name to search for".to_string());
        }

        if let Some(cached) = self.cache.get(&normalized, self.search_limit) {
            tracing::debug!(query = %normalized, "Resolution cache hit");
            return cached;
        }

        match self.roster.search_members(&normalized, self.search_limit) {
            Ok(candidates) => {
                let resolution = self.decide(query, candidates);
                tracing::info!(query, status = ?resolution.status(), "Resolved query");
                self.cache
                    .insert(&normalized, self.search_limit, resolution.clone());
                resolution
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "Roster search failed");
                Resolution::NoMatch(search_error_message(&err))
            }
        }
    }

    /// Resolve an explicit choice of `id` made from an earlier answer to `query`.
    pub fn resolve_choice(&self, query: &str, id: u32) -> Result<ResolvedIdentity, BioError> {
        match self.resolve(query) {
            Resolution::Confirmed(identity) if identity.id() == id => Ok(identity),
            Resolution::Confirmed(_) | Resolution::NoMatch(_) => Err(BioError::NotFound {
                what: format!("member {} among the matches for `{}`", id, query),
            }),
            Resolution::Suggestions(ranked) => {
                let chosen = ranked
                    .into_iter()
                    .find(|s| s.candidate.id == id)
                    .ok_or_else(|| BioError::NotFound {
                        what: format!("member {} among the matches for `{}`", id, query),
                    })?;
                ResolvedIdentity::new(chosen.candidate)
            }
        }
    }

    /// Score and rank candidates, keeping current primary-chamber members only.
    pub fn rank(&self, query: &str, candidates: Vec<EntityCandidate>) -> Vec<ScoredCandidate> {
        let mut seen = HashSet::new();
        let mut ranked: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter(|c| c.chamber == PRIMARY_CHAMBER && c.current)
            .filter(|c| seen.insert(c.id))
            .map(|candidate| ScoredCandidate {
                similarity: similarity(query, &candidate.display_name),
                candidate,
            })
            .collect();
        // Stable: ties keep roster order.
        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        ranked
    }

    fn decide(&self, query: &str, candidates: Vec<EntityCandidate>) -> Resolution {
        let ranked = self.rank(query, candidates);

        let best = ranked.first().map(|s| s.similarity).unwrap_or(0.0);
        let runner_up = ranked.get(1).map(|s| s.similarity);
        let clear_winner = best >= self.config.auto_select_threshold
            && runner_up.map_or(true, |r| r < self.config.runner_up_ceiling);

        if clear_winner {
            if let Some(top) = ranked.first() {
                return match ResolvedIdentity::new(top.candidate.clone()) {
                    Ok(identity) => Resolution::Confirmed(identity),
                    Err(err) => Resolution::NoMatch(err.to_string()),
                };
            }
        }

        let suggestions: Vec<ScoredCandidate> = ranked
            .into_iter()
            .filter(|s| s.similarity >= self.config.suggestion_floor)
            .take(self.config.max_suggestions)
            .collect();

        if suggestions.is_empty() {
            Resolution::NoMatch(format!("No current MP matches `{}`", query.trim()))
        } else {
            Resolution::Suggestions(suggestions)
        }
    }
}

fn search_error_message(err: &SourceError) -> String {
    format!("Member search error: {}", err)
}
