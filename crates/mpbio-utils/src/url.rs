//! URL normalization helpers.

use reqwest::Url;

use crate::UtilsError;

/// Resolve `path` against `base`, returning an absolute URL.
///
/// Absolute inputs are returned unchanged (after parsing). Relative paths,
/// with or without a leading slash, are joined onto the host of `base`.
/// Surrounding whitespace and JSON string quotes are tolerated.
pub fn absolutize(base: &str, path: &str) -> Result<String, UtilsError> {
    let trimmed = path.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        return Err(UtilsError::EmptyContent);
    }

    if let Ok(url) = Url::parse(trimmed) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(url.to_string());
        }
        return Err(UtilsError::InvalidUrl(trimmed.to_string()));
    }

    let base_url = Url::parse(base).map_err(|_| UtilsError::InvalidUrl(base.to_string()))?;
    let relative = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    base_url
        .join(&relative)
        .map(|u| u.to_string())
        .map_err(|_| UtilsError::InvalidUrl(trimmed.to_string()))
}
