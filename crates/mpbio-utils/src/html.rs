//! HTML to text conversion.
//!
//! Pages are converted to Markdown with htmd first so headings survive as
//! `## Heading` lines, then reduced to plain text by [`markdown_to_plain`].

use std::sync::OnceLock;

use regex::Regex;

use crate::UtilsError;

/// Convert an HTML fragment to Markdown.
pub fn html_to_markdown(html: &str) -> Result<String, UtilsError> {
    let markdown = htmd::convert(html)
        .map_err(|e| UtilsError::ExtractionError(format!("Failed to convert HTML: {}", e)))?;

    if markdown.trim().is_empty() {
        return Err(UtilsError::EmptyContent);
    }

    Ok(markdown)
}

/// Convert an HTML fragment straight to plain text.
pub fn html_to_text(html: &str) -> Result<String, UtilsError> {
    html_to_markdown(html).map(|md| markdown_to_plain(&md))
}

struct Patterns {
    citation_link: Regex,
    bare_citation: Regex,
    image: Regex,
    link: Regex,
    emphasis: Regex,
    spaces: Regex,
    space_before_punct: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        citation_link: Regex::new(r"\[\[(?:\d+|[a-z]|note \d+|citation needed|edit)\]\]\([^)]*\)")
            .expect("valid regex"),
        bare_citation: Regex::new(r"\[(?:\d+|[a-z]|note \d+|citation needed|edit)\]")
            .expect("valid regex"),
        image: Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("valid regex"),
        link: Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid regex"),
        emphasis: Regex::new(r"\*\*|__").expect("valid regex"),
        spaces: Regex::new(r"[ \t]{2,}").expect("valid regex"),
        space_before_punct: Regex::new(r" +([.,;:])").expect("valid regex"),
    })
}

/// Reduce Markdown to plain text.
///
/// Keeps heading markers and line structure; drops images, link targets,
/// footnote markers (`[1]`, `[citation needed]`, `[edit]`) and bold markers.
pub fn markdown_to_plain(markdown: &str) -> String {
    let p = patterns();
    let unescaped = markdown
        .replace("\\[", "[")
        .replace("\\]", "]")
        .replace("\\_", "_")
        .replace("\\*", "*");

    let text = p.citation_link.replace_all(&unescaped, "");
    let text = p.bare_citation.replace_all(&text, "");
    let text = p.image.replace_all(&text, "");
    let text = p.link.replace_all(&text, "$1");
    let text = p.emphasis.replace_all(&text, "");

    text.lines()
        .map(|line| {
            let line = p.spaces.replace_all(line, " ");
            p.space_before_punct.replace_all(&line, "$1").trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
