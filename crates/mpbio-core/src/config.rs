//! Configuration types for mpbio.
//!
//! [`GlobalConfig`] is loaded from `~/.mpbio/config.yaml` (or an explicit
//! path). Every section is optional; missing keys fall back to the defaults
//! defined here, so mpbio works without any configuration file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mpbio_utils::HttpSettings;

use crate::errors::BioError;

// ============================================================================
// Defaults
// ============================================================================

/// Default per-request timeout for data sources, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 8;

/// Default character budget for the packed encyclopedia excerpt.
pub const DEFAULT_EXCERPT_BUDGET_CHARS: usize = 3_500;

/// Fill ratio under which the relaxed packing pass runs.
pub const DEFAULT_RELAXED_FILL_RATIO: f64 = 0.7;

/// Default trailing search window, in months.
pub const DEFAULT_SEARCH_WINDOW_MONTHS: u32 = 24;

/// Default maximum number of contribution records per search.
pub const DEFAULT_RESULT_CAP: usize = 10;

/// Contributions shorter than this many characters are treated as noise.
pub const DEFAULT_MIN_CONTRIBUTION_CHARS: usize = 50;

/// Directory name under the home directory.
pub const CONFIG_DIR_NAME: &str = ".mpbio";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.yaml";

// ============================================================================
// GlobalConfig
// ============================================================================

/// User-level configuration.
///
/// # Example YAML
///
/// ```yaml
/// http:
///   timeout_secs: 5
/// generator:
///   model: claude-3-7-sonnet-20250219
/// evidence:
///   excerpt_budget_chars: 3000
/// search:
///   result_cap: 12
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub roster: RosterConfig,

    #[serde(default)]
    pub encyclopedia: EncyclopediaConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub evidence: EvidenceConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl GlobalConfig {
    /// Load the configuration from the default location (`~/.mpbio/config.yaml`).
    ///
    /// If the file does not exist, returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BioError::InvalidGlobalConfig`] if the file exists but cannot be parsed.
    pub fn load_default() -> Result<Self, BioError> {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load the configuration from a specific path.
    ///
    /// If the file does not exist, returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BioError::InvalidGlobalConfig`] if the file exists but cannot be parsed.
    /// Returns [`BioError::InvalidConfiguration`] if validation fails.
    pub fn from_path(path: &Path) -> Result<Self, BioError> {
        if !path.exists() {
            tracing::debug!("Config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            BioError::InvalidGlobalConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            BioError::InvalidGlobalConfig(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        for warning in config.validate()? {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    /// Get the default config directory (`~/.mpbio`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME))
    }

    /// Get the default config file path (`~/.mpbio/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Validate the configuration.
    ///
    /// Returns non-fatal warnings; hard errors are returned as
    /// [`BioError::InvalidConfiguration`].
    pub fn validate(&self) -> Result<Vec<String>, BioError> {
        let mut warnings = Vec::new();

        if self.http.timeout_secs == 0 {
            return Err(invalid(
                "http.timeout_secs must be greater than 0",
                "Use a short timeout such as 8",
            ));
        }
        if self.http.timeout_secs >= 10 {
            warnings.push(format!(
                "http.timeout_secs is {}s; data sources are expected to answer within a few seconds",
                self.http.timeout_secs
            ));
        }
        if self.generator.timeout_secs == 0 {
            return Err(invalid(
                "generator.timeout_secs must be greater than 0",
                "Narrative generation usually needs 30-90 seconds",
            ));
        }

        let r = &self.resolver;
        for (name, value) in [
            ("resolver.auto_select_threshold", r.auto_select_threshold),
            ("resolver.runner_up_ceiling", r.runner_up_ceiling),
            ("resolver.suggestion_floor", r.suggestion_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(
                    &format!("{} must be between 0 and 1 (got {})", name, value),
                    "Similarity scores are ratios in [0, 1]",
                ));
            }
        }
        if r.runner_up_ceiling > r.auto_select_threshold {
            return Err(invalid(
                &format!(
                    "resolver.runner_up_ceiling ({}) must not exceed resolver.auto_select_threshold ({})",
                    r.runner_up_ceiling, r.auto_select_threshold
                ),
                "Otherwise two candidates at or above the threshold could still auto-select one",
            ));
        }
        if r.suggestion_floor > r.auto_select_threshold {
            warnings.push(
                "resolver.suggestion_floor is above auto_select_threshold; no suggestions will ever be offered"
                    .to_string(),
            );
        }
        if r.max_suggestions == 0 {
            return Err(invalid(
                "resolver.max_suggestions must be greater than 0",
                "The default is 10",
            ));
        }

        if self.evidence.excerpt_budget_chars == 0 {
            return Err(invalid(
                "evidence.excerpt_budget_chars must be greater than 0",
                "The default is 3500",
            ));
        }
        if !(0.0..=1.0).contains(&self.evidence.relaxed_fill_ratio) {
            return Err(invalid(
                "evidence.relaxed_fill_ratio must be between 0 and 1",
                "The default is 0.7",
            ));
        }

        if self.search.result_cap == 0 {
            return Err(invalid(
                "search.result_cap must be greater than 0",
                "The default is 10",
            ));
        }
        if self.search.window_months == 0 {
            return Err(invalid(
                "search.window_months must be greater than 0",
                "The default is 24",
            ));
        }

        if self.generator.api_key().is_none() {
            warnings.push(format!(
                "Environment variable {} is not set; generation and topic expansion will fail",
                self.generator.api_key_env
            ));
        }

        Ok(warnings)
    }

    /// HTTP settings for data-source calls.
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.http.timeout_secs),
            user_agent: self.http.user_agent.clone(),
        }
    }
}

fn invalid(message: &str, hint: &str) -> BioError {
    BioError::InvalidConfiguration {
        message: message.to_string(),
        hint: hint.to_string(),
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Outbound HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: mpbio_utils::http::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Members roster (UK Parliament Members API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub api_url: String,
    /// Members public profile URL; `{id}` is replaced by the member id.
    pub profile_url: String,
    /// Maximum candidates requested per name search.
    pub search_limit: usize,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            api_url: "https://members-api.parliament.uk/api".to_string(),
            profile_url: "https://members.parliament.uk/member/{id}/career".to_string(),
            search_limit: 20,
        }
    }
}

/// Encyclopedia (MediaWiki action API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncyclopediaConfig {
    pub api_url: String,
    /// Prefix for human-readable page URLs.
    pub page_url: String,
    /// Page whose links form the roster-derived candidate list.
    pub roster_list_title: String,
}

impl Default for EncyclopediaConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            page_url: "https://en.wikipedia.org/wiki/".to_string(),
            roster_list_title: "List of MPs elected in the 2024 United Kingdom general election"
                .to_string(),
        }
    }
}

/// Legislative archive (Hansard).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub api_url: String,
    /// Public web host used to absolutize contribution paths.
    pub web_url: String,
    /// Lookup endpoint path; `{id}` is replaced by the contribution id.
    pub contribution_url_path: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            api_url: "https://hansard-api.parliament.uk".to_string(),
            web_url: "https://hansard.parliament.uk".to_string(),
            contribution_url_path: "/search/contributionurl/{id}.json".to_string(),
        }
    }
}

/// Generative text service (Anthropic Messages API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub api_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Timeout for narrative generation, in seconds.
    pub timeout_secs: u64,
    /// Token limit for topic expansion.
    pub planner_max_tokens: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-3-7-sonnet-20250219".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            anthropic_version: "2023-06-01".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: 60,
            planner_max_tokens: 200,
        }
    }
}

impl GeneratorConfig {
    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

/// Entity resolution thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum similarity for an automatic pick.
    pub auto_select_threshold: f64,
    /// The runner-up must score below this for an automatic pick.
    pub runner_up_ceiling: f64,
    /// Minimum similarity for a candidate to be suggested.
    pub suggestion_floor: f64,
    pub max_suggestions: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            auto_select_threshold: 0.95,
            runner_up_ceiling: 0.85,
            suggestion_floor: 0.6,
            max_suggestions: 10,
        }
    }
}

/// Evidence aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    pub excerpt_budget_chars: usize,
    pub relaxed_fill_ratio: f64,
    /// Section title keywords admitted in the first packing pass.
    pub priority_sections: Vec<String>,
    /// Section title keywords never admitted.
    pub excluded_sections: Vec<String>,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            excerpt_budget_chars: DEFAULT_EXCERPT_BUDGET_CHARS,
            relaxed_fill_ratio: DEFAULT_RELAXED_FILL_RATIO,
            priority_sections: [
                "early life",
                "education",
                "career",
                "political career",
                "parliamentary career",
                "views",
                "political views",
                "controversies",
                "personal life",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            excluded_sections: [
                "see also",
                "references",
                "external links",
                "notes",
                "bibliography",
                "further reading",
                "citations",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Legislative record search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub window_months: u32,
    pub result_cap: usize,
    pub min_contribution_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            window_months: DEFAULT_SEARCH_WINDOW_MONTHS,
            result_cap: DEFAULT_RESULT_CAP,
            min_contribution_chars: DEFAULT_MIN_CONTRIBUTION_CHARS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.http.timeout_secs, 8);
        assert_eq!(config.evidence.excerpt_budget_chars, 3500);
        assert_eq!(config.resolver.auto_select_threshold, 0.95);
        assert_eq!(config.resolver.runner_up_ceiling, 0.85);
        assert_eq!(config.resolver.suggestion_floor, 0.6);
        assert_eq!(config.resolver.max_suggestions, 10);
        assert_eq!(config.search.window_months, 24);
        assert_eq!(config.search.min_contribution_chars, 50);
        assert!(config
            .evidence
            .excluded_sections
            .contains(&"external links".to_string()));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = GlobalConfig::from_path(&temp.path().join("nope.yaml")).unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn test_partial_yaml_merges_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            "http:\n  timeout_secs: 5\nsearch:\n  result_cap: 12\n",
        )
        .unwrap();

        let config = GlobalConfig::from_path(&path).unwrap();
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.search.result_cap, 12);
        assert_eq!(config.search.window_months, 24);
        assert_eq!(config.roster, RosterConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "http: [not, a, map").unwrap();
        assert!(matches!(
            GlobalConfig::from_path(&path),
            Err(BioError::InvalidGlobalConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = GlobalConfig::default();
        config.resolver.auto_select_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(BioError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_ceiling_above_threshold() {
        let mut config = GlobalConfig::default();
        config.resolver.auto_select_threshold = 0.9;
        config.resolver.runner_up_ceiling = 0.97;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("runner_up_ceiling"));

        config.resolver.runner_up_ceiling = 0.9;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = GlobalConfig::default();
        config.evidence.excerpt_budget_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_warns_on_slow_timeout() {
        let mut config = GlobalConfig::default();
        config.http.timeout_secs = 30;
        let warnings = config.validate().unwrap();
        assert!(warnings.iter().any(|w| w.contains("timeout_secs")));
    }

    #[test]
    fn test_http_settings() {
        let config = GlobalConfig::default();
        let settings = config.http_settings();
        assert_eq!(settings.timeout, Duration::from_secs(8));
    }
}
