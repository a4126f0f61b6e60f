//! Topic expansion for legislative record search.
//!
//! A free-text topic ("housing", "the cost of living") rarely matches the
//! wording used in debates. The planner asks the generative service for a
//! handful of short search phrases and parses its answer defensively. When
//! the service fails, the plan degrades to the literal topic.
//!
//! ## Example
//!
//! ```ignore
//! use mpbio_core::query_expansion::TopicSearchPlanner;
//!
//! let planner = TopicSearchPlanner::new(&generator, 200);
//! let plan = planner.plan("housing", "Jane Doe");
//! // plan.expanded_terms: ["affordable housing", "social housing", "housebuilding targets"]
//! ```

use std::collections::HashSet;

use crate::sources::{GenerationPurpose, GenerationRequest, TextGenerator};
use crate::types::SearchQueryPlan;

/// Upper bound on phrases kept from one answer.
pub const MAX_PHRASES: usize = 5;

/// Low temperature keeps the phrases on topic.
const PLANNER_TEMPERATURE: f32 = 0.3;

/// Leading characters that mark list or markup artifacts.
const ARTIFACT_PREFIXES: &[char] = &['-', '*', '•', '#', '>', '`'];

const QUOTES: &[char] = &['"', '\'', '“', '”', '‘', '’'];

// ============================================================================
// Parsing
// ============================================================================

/// True for `1.` / `12)` style numbered list prefixes.
fn is_numbered(line: &str) -> bool {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && matches!(line[digits..].chars().next(), Some('.') | Some(')'))
}

/// Parse one phrase per line, dropping artifacts and duplicates.
pub fn parse_phrases(answer: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut phrases = Vec::new();

    for line in answer.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with(ARTIFACT_PREFIXES)
            || is_numbered(line)
            || line.ends_with(':')
        {
            continue;
        }

        let phrase = line.trim_matches(QUOTES).trim();
        if phrase.is_empty() || !seen.insert(phrase.to_lowercase()) {
            continue;
        }
        phrases.push(phrase.to_string());
        if phrases.len() == MAX_PHRASES {
            break;
        }
    }

    phrases
}

fn build_prompt(topic: &str, member_name: &str) -> String {
    format!(
        "Suggest 3 to 5 short, distinct search phrases (two to four words each) that would find \
         speeches by {member} about \"{topic}\" in a full-text search of UK parliamentary debates. \
         Use wording an MP would actually say in the chamber. \
         Reply with one phrase per line and nothing else: no numbering, bullets or commentary.",
        member = member_name,
        topic = topic
    )
}

// ============================================================================
// Planner
// ============================================================================

/// Expands a topic into search phrases through a [`TextGenerator`].
pub struct TopicSearchPlanner<'a> {
    generator: &'a dyn TextGenerator,
    max_tokens: u32,
}

impl<'a> TopicSearchPlanner<'a> {
    pub fn new(generator: &'a dyn TextGenerator, max_tokens: u32) -> Self {
        Self {
            generator,
            max_tokens,
        }
    }

    /// Plan the search for `topic`. Never fails; falls back to the literal topic.
    pub fn plan(&self, topic: &str, member_name: &str) -> SearchQueryPlan {
        let topic = topic.trim();
        let request = GenerationRequest {
            purpose: GenerationPurpose::TopicExpansion,
            system: None,
            prompt: build_prompt(topic, member_name),
            max_tokens: self.max_tokens,
            temperature: PLANNER_TEMPERATURE,
        };

        match self.generator.generate(&request) {
            Ok(answer) => {
                let phrases = parse_phrases(&answer);
                if phrases.is_empty() {
                    tracing::warn!(topic, "Topic expansion returned no usable phrases");
                    return SearchQueryPlan::literal(topic);
                }
                tracing::debug!(topic, phrases = ?phrases, "Topic expanded");
                SearchQueryPlan {
                    original_topic: topic.to_string(),
                    expanded_terms: phrases,
                }
            }
            Err(err) => {
                tracing::warn!(topic, error = %err, "Topic expansion failed, searching the literal topic");
                SearchQueryPlan::literal(topic)
            }
        }
    }
}
