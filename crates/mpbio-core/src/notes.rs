//! Caller-supplied notes about a member.
//!
//! Notes come from a text file or a PDF brief. PDFs are detected by
//! extension and run through `pdf-extract`; everything else is read as UTF-8.

use std::fs;
use std::path::Path;

use crate::errors::BioError;

/// True when `path` has a `.pdf` extension (any case).
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Read the notes file at `path` as plain text.
///
/// # Errors
///
/// - [`BioError::Io`] if the file cannot be read
/// - [`BioError::InvalidArgument`] if a PDF yields no extractable text
pub fn read_notes(path: &Path) -> Result<String, BioError> {
    let text = if is_pdf(path) {
        let bytes = fs::read(path)?;
        let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
            BioError::InvalidArgument(format!(
                "Could not extract text from PDF {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!(path = %path.display(), chars = text.len(), "Extracted PDF notes");
        text
    } else {
        fs::read_to_string(path)?
    };
    Ok(tidy(&text))
}

/// Trim every line and keep at most one blank line between paragraphs.
fn tidy(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && out.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("brief.pdf")));
        assert!(is_pdf(Path::new("BRIEF.PDF")));
        assert!(!is_pdf(Path::new("brief.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_text_notes_are_tidied() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "\n  Former barrister.  \n\n\n\nChairs a charity.\n\n").unwrap();
        assert_eq!(read_notes(&path).unwrap(), "Former barrister.\n\nChairs a charity.");
    }

    #[test]
    fn test_unreadable_pdf_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("brief.pdf");
        fs::write(&path, "plain text pretending to be a PDF").unwrap();
        let err = read_notes(&path).unwrap_err();
        assert!(err.to_string().contains("PDF"));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            read_notes(&temp.path().join("absent.txt")),
            Err(BioError::Io(_))
        ));
    }
}
