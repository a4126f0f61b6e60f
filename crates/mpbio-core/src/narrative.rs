//! Narrative generation requests.
//!
//! Builds the single prompt sent to the generator: identity, today's date,
//! the evidence bundle, style exemplars and the numbered reference list.
//! Ordinals are assigned here, at handover, and never change afterwards.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::errors::BioError;
use crate::evidence::EvidenceBundle;
use crate::sources::{GenerationPurpose, GenerationRequest};
use crate::types::{Evidence, EvidenceItem};

/// Characters of each evidence text shown in the reference list.
const REFERENCE_PREVIEW_CHARS: usize = 160;

const NO_ACTIVITY: &str = "No recent contributions found in Parliament. \
Do not describe any recent parliamentary activity.";

const SYSTEM_PROMPT: &str = "You write short, factual biographies of UK Members of Parliament for briefing packs. \
You only state facts present in the material you are given.";

// ============================================================================
// Exemplars
// ============================================================================

/// A finished biography used as a style reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exemplar {
    pub name: String,
    pub text: String,
}

/// Load every `.txt` and `.md` file in `dir`, sorted by file name.
pub fn load_exemplars(dir: &Path) -> Result<Vec<Exemplar>, BioError> {
    if !dir.is_dir() {
        return Err(BioError::InvalidArgument(format!(
            "Exemplar directory {} does not exist",
            dir.display()
        )));
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("md"))
        })
        .collect();
    paths.sort();

    let mut exemplars = Vec::new();
    for path in paths {
        let text = fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            continue;
        }
        exemplars.push(Exemplar {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            text: text.trim().to_string(),
        });
    }

    tracing::debug!(dir = %dir.display(), count = exemplars.len(), "Loaded style exemplars");
    Ok(exemplars)
}

// ============================================================================
// Request building
// ============================================================================

/// A generation request together with the items its markers refer to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeRequest {
    pub request: GenerationRequest,
    /// Items in ordinal order; `items[n - 1]` is `[REF-n]`.
    pub items: Vec<EvidenceItem>,
}

/// Number evidence 1..=n in the given order.
pub fn assign_ordinals(evidence: Vec<Evidence>) -> Vec<EvidenceItem> {
    evidence
        .into_iter()
        .enumerate()
        .map(|(i, e)| e.into_item(i + 1))
        .collect()
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= REFERENCE_PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(REFERENCE_PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

fn reference_line(item: &EvidenceItem) -> String {
    let mut line = format!("{} ({}", item.marker(), item.source_type);
    if let Some(date) = item.date {
        line.push_str(&format!(", {}", date));
    }
    line.push_str(&format!(") {}", preview(&item.text)));
    if let Some(url) = &item.url {
        line.push_str(&format!(" <{}>", url));
    }
    line
}

pub struct NarrativeBuilder<'a> {
    config: &'a GeneratorConfig,
    exemplars: &'a [Exemplar],
    today: NaiveDate,
}

impl<'a> NarrativeBuilder<'a> {
    pub fn new(config: &'a GeneratorConfig, exemplars: &'a [Exemplar], today: NaiveDate) -> Self {
        Self {
            config,
            exemplars,
            today,
        }
    }

    /// Build the request for `bundle` plus any legislative-record evidence.
    ///
    /// `activity` is `None` when no record search ran. An empty slice means a
    /// search ran and found nothing, which the prompt states explicitly.
    pub fn build(&self, bundle: &EvidenceBundle, activity: Option<&[Evidence]>) -> NarrativeRequest {
        let mut evidence = bundle.evidence.clone();
        evidence.extend(activity.unwrap_or_default().iter().cloned());
        let items = assign_ordinals(evidence);

        let prompt = self.prompt(bundle, activity, &items);
        NarrativeRequest {
            request: GenerationRequest {
                purpose: GenerationPurpose::Narrative,
                system: Some(SYSTEM_PROMPT.to_string()),
                prompt,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            },
            items,
        }
    }

    fn prompt(
        &self,
        bundle: &EvidenceBundle,
        activity: Option<&[Evidence]>,
        items: &[EvidenceItem],
    ) -> String {
        let identity = &bundle.identity;
        let candidate = identity.candidate();
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "Write a new biography of {}, {} MP for {}.\n",
            identity.name(),
            candidate.party_label(),
            candidate.constituency_label()
        ));
        prompt.push_str(&format!(
            "Today's date is {}. Use it to decide which roles are current and which are past.\n\n",
            self.today
        ));

        prompt.push_str(
            "Structure:\n\
             1. A title line with the member's name and current role.\n\
             2. Party and constituency in parentheses on their own line.\n\
             3. A short introduction covering the current position and verified roles.\n\
             4. A \"Politics\" section. This is the longest section.\n\
             5. A \"Background\" section on life and career outside politics.\n\
             6. A \"Sources\" section with one bullet per reference you relied on, each ending with its marker, for example \"- Members profile [REF-1]\".\n\n",
        );

        prompt.push_str(
            "Rules:\n\
             - Use only facts from the evidence below. Prefer named positions, organisations, titles and years.\n\
             - Mention committee memberships and government or opposition roles only if they appear under VERIFIED PARLIAMENTARY POSITIONS. Work them into the prose instead of listing them.\n\
             - No generic statements about the duties of an MP.\n\
             - If recent parliamentary activity is listed, summarise it in one or two sentences at the end of the Politics section.\n\
             - Use British English spelling throughout.\n\
             - Do not give a date of birth or details of donations.\n\
             - Rephrase the evidence; do not copy sentences from it.\n\n",
        );

        if !self.exemplars.is_empty() {
            prompt.push_str("Style examples. Copy their layout and tone, never their facts:\n");
            for exemplar in self.exemplars {
                prompt.push_str("---\n");
                prompt.push_str(&exemplar.text);
                prompt.push('\n');
            }
            prompt.push_str("---\n\n");
        }

        prompt.push_str("Evidence:\n");
        prompt.push_str(&bundle.text);
        prompt.push_str("\n\n");

        match activity {
            Some([]) => {
                prompt.push_str("RECENT PARLIAMENTARY ACTIVITY:\n");
                prompt.push_str(NO_ACTIVITY);
                prompt.push_str("\n\n");
            }
            Some(entries) => {
                prompt.push_str("RECENT PARLIAMENTARY ACTIVITY:\n");
                for entry in entries {
                    prompt.push_str(&format!("- {}\n", preview(&entry.text)));
                }
                prompt.push('\n');
            }
            None => {}
        }

        if !items.is_empty() {
            prompt.push_str("References (cite with the marker):\n");
            for item in items {
                prompt.push_str(&reference_line(item));
                prompt.push('\n');
            }
        }

        prompt
    }
}
