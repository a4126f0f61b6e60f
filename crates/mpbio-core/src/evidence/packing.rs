//! Budget-constrained packing of an encyclopedia page into an excerpt.
//!
//! The lead comes first. Priority sections are then appended in source order
//! while they fit; if the excerpt is still short, a relaxed pass admits any
//! other non-excluded section. Sections are never split.

use crate::sources::EncyclopediaPage;

/// Separator placed between excerpt parts.
const PART_SEPARATOR: &str = "\n\n";

/// Packing parameters, usually borrowed from `EvidenceConfig`.
#[derive(Debug, Clone, Copy)]
pub struct PackingRules<'a> {
    pub budget: usize,
    pub relaxed_fill_ratio: f64,
    pub priority: &'a [String],
    pub excluded: &'a [String],
}

/// One packed part: the lead (no title) or a whole section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcerptPart {
    pub title: Option<String>,
    pub text: String,
}

impl ExcerptPart {
    fn rendered(&self) -> String {
        match &self.title {
            Some(title) => format!("{}\n{}", title, self.text),
            None => self.text.clone(),
        }
    }
}

/// The packed excerpt, parts in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedExcerpt {
    pub parts: Vec<ExcerptPart>,
    /// True when the lead had to be cut to fit the budget.
    pub lead_truncated: bool,
}

impl PackedExcerpt {
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(ExcerptPart::rendered)
            .collect::<Vec<_>>()
            .join(PART_SEPARATOR)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Titles of the packed sections.
    pub fn section_titles(&self) -> Vec<&str> {
        self.parts.iter().filter_map(|p| p.title.as_deref()).collect()
    }
}

fn chars(text: &str) -> usize {
    text.chars().count()
}

fn title_matches(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.trim().is_empty() && title.contains(&k.trim().to_lowercase()))
}

/// Cut `text` at the last sentence end that keeps it within `budget` chars.
fn cut_at_sentence(text: &str, budget: usize) -> String {
    let mut best = 0;
    for (count, (idx, ch)) in text.char_indices().enumerate() {
        if count + 1 > budget {
            break;
        }
        let end = idx + ch.len_utf8();
        let at_boundary = matches!(ch, '.' | '!' | '?')
            && text[end..].chars().next().map_or(true, char::is_whitespace);
        if at_boundary {
            best = end;
        }
    }
    text[..best].trim_end().to_string()
}

/// Pack `page` under `rules.budget` characters.
pub fn pack(page: &EncyclopediaPage, rules: &PackingRules<'_>) -> PackedExcerpt {
    let mut excerpt = PackedExcerpt::default();
    let mut used = 0usize;

    let lead = page.lead.trim();
    if !lead.is_empty() {
        let text = if chars(lead) > rules.budget {
            excerpt.lead_truncated = true;
            cut_at_sentence(lead, rules.budget)
        } else {
            lead.to_string()
        };
        if !text.is_empty() {
            used = chars(&text);
            excerpt.parts.push(ExcerptPart { title: None, text });
        }
    }

    let candidates: Vec<(usize, ExcerptPart)> = page
        .sections
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.text.trim().is_empty())
        .filter(|(_, s)| !title_matches(&s.title, rules.excluded))
        .map(|(i, s)| {
            (
                i,
                ExcerptPart {
                    title: Some(s.title.trim().to_string()),
                    text: s.text.trim().to_string(),
                },
            )
        })
        .collect();

    let mut admitted = vec![false; candidates.len()];
    let mut admit = |relaxed: bool, used: &mut usize| {
        for (slot, (_, part)) in candidates.iter().enumerate() {
            if admitted[slot] {
                continue;
            }
            let is_priority = part
                .title
                .as_deref()
                .is_some_and(|t| title_matches(t, rules.priority));
            if !relaxed && !is_priority {
                continue;
            }
            let separator = if *used == 0 { 0 } else { chars(PART_SEPARATOR) };
            let cost = separator + chars(&part.rendered());
            if *used + cost <= rules.budget {
                *used += cost;
                admitted[slot] = true;
            }
        }
    };

    admit(false, &mut used);
    let fill = used as f64 / rules.budget.max(1) as f64;
    if fill < rules.relaxed_fill_ratio {
        tracing::debug!(fill, "Excerpt under fill ratio, running relaxed pass");
        admit(true, &mut used);
    }

    // Source order regardless of which pass admitted the section.
    excerpt.parts.extend(
        candidates
            .into_iter()
            .zip(admitted)
            .filter(|(_, keep)| *keep)
            .map(|((_, part), _)| part),
    );
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvidenceConfig;
    use crate::sources::fake::page;

    fn rules(config: &EvidenceConfig, budget: usize) -> PackingRules<'_> {
        PackingRules {
            budget,
            relaxed_fill_ratio: config.relaxed_fill_ratio,
            priority: &config.priority_sections,
            excluded: &config.excluded_sections,
        }
    }

    #[test]
    fn test_priority_then_source_order() {
        let config = EvidenceConfig::default();
        let page = page(
            "Jane Doe",
            "Jane Doe is an MP.",
            &[
                ("Hobbies", "Enjoys rowing."),
                ("Early life", "Born in Anytown."),
                ("References", "1. Something"),
                ("Political career", "Elected in 2019."),
            ],
        );
        let packed = pack(&page, &rules(&config, 3500));

        // Relaxed pass admits Hobbies, but it keeps its source position.
        assert_eq!(
            packed.section_titles(),
            vec!["Hobbies", "Early life", "Political career"]
        );
        assert!(packed.text().starts_with("Jane Doe is an MP."));
        assert!(!packed.text().contains("References"));
    }

    #[test]
    fn test_relaxed_pass_skipped_when_filled() {
        let config = EvidenceConfig::default();
        let body = "x".repeat(80);
        let page = page(
            "Jane Doe",
            "Lead.",
            &[("Career", &body), ("Hobbies", "Rowing.")],
        );
        // Lead 5 + sep 2 + "Career\n" 7 + 80 = 94 of 100: above 70%.
        let packed = pack(&page, &rules(&config, 100));
        assert_eq!(packed.section_titles(), vec!["Career"]);
    }

    #[test]
    fn test_overflowing_section_skipped_whole() {
        let config = EvidenceConfig::default();
        let long = "y".repeat(200);
        let page = page(
            "Jane Doe",
            "Lead.",
            &[("Early life", &long), ("Education", "Went to school.")],
        );
        let packed = pack(&page, &rules(&config, 100));
        assert_eq!(packed.section_titles(), vec!["Education"]);
        assert!(!packed.text().contains('y'));
    }

    #[test]
    fn test_budget_is_never_exceeded() {
        let config = EvidenceConfig::default();
        let sections: Vec<(String, String)> = (0..20)
            .map(|i| (format!("Career {}", i), "z".repeat(37 + i * 11)))
            .collect();
        let refs: Vec<(&str, &str)> = sections
            .iter()
            .map(|(t, b)| (t.as_str(), b.as_str()))
            .collect();
        let page = page("Jane Doe", "A short lead. Another sentence.", &refs);

        for budget in [10, 50, 120, 333, 800, 3500] {
            let packed = pack(&page, &rules(&config, budget));
            assert!(
                packed.text().chars().count() <= budget,
                "budget {budget} exceeded"
            );
        }
    }

    #[test]
    fn test_long_lead_cut_at_sentence() {
        let config = EvidenceConfig::default();
        let page = page(
            "Jane Doe",
            "First sentence here. Second sentence is longer than the rest.",
            &[],
        );
        let packed = pack(&page, &rules(&config, 30));
        assert!(packed.lead_truncated);
        assert_eq!(packed.text(), "First sentence here.");
    }

    #[test]
    fn test_lead_without_boundary_is_dropped() {
        let config = EvidenceConfig::default();
        let page = page("Jane Doe", "no boundary at all in this lead", &[]);
        let packed = pack(&page, &rules(&config, 10));
        assert!(packed.is_empty());
    }
}
