use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Weights are considered already normalized within this tolerance.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A 0–100 fear/greed index endpoint.
    FearGreed,
    /// A subreddit listing read through the Reddit API.
    Reddit,
    /// A JSON Feed (or RSS 2.0) news feed.
    NewsFeed,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::FearGreed => write!(f, "fear_greed"),
            SourceKind::Reddit => write!(f, "reddit"),
            SourceKind::NewsFeed => write!(f, "news_feed"),
        }
    }
}

/// One configured sentiment source and its aggregation weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    pub url: Option<String>,
    pub weight: f64,
    /// Per-source request timeout; falls back to the global request timeout.
    pub timeout_secs: Option<u64>,
    pub subreddit: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<SourceConfig>,
}

impl SourcesFile {
    /// Sum of all configured weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.sources.iter().map(|s| s.weight).sum()
    }
}

/// Load, validate, and weight-normalize the source definitions from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_sources(&content)
}

/// Parse source definitions from a YAML string.
///
/// Weights are rescaled so they sum to `1.0`; a file whose weights already sum
/// to one is returned unchanged.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_sources(yaml: &str) -> Result<SourcesFile, ConfigError> {
    let mut sources_file: SourcesFile = serde_yaml::from_str(yaml)?;
    validate_sources(&sources_file)?;
    normalize_weights(&mut sources_file);
    Ok(sources_file)
}

fn validate_sources(sources_file: &SourcesFile) -> Result<(), ConfigError> {
    if sources_file.sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one source must be configured".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();

    for source in &sources_file.sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(source.name.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name: '{}'",
                source.name
            )));
        }

        if !source.weight.is_finite() || source.weight < 0.0 {
            return Err(ConfigError::Validation(format!(
                "source '{}' has invalid weight {}; must be a finite number >= 0",
                source.name, source.weight
            )));
        }

        match source.kind {
            SourceKind::FearGreed | SourceKind::NewsFeed => {
                let url = source.url.as_deref().map(str::trim).unwrap_or_default();
                if url.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "source '{}' ({}) requires a url",
                        source.name, source.kind
                    )));
                }
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::Validation(format!(
                        "source '{}' has non-http url '{url}'",
                        source.name
                    )));
                }
            }
            SourceKind::Reddit => {
                if let Some(subreddit) = source.subreddit.as_deref() {
                    if subreddit.trim().is_empty() {
                        return Err(ConfigError::Validation(format!(
                            "source '{}' has an empty subreddit",
                            source.name
                        )));
                    }
                    if !is_valid_subreddit(subreddit) {
                        return Err(ConfigError::Validation(format!(
                            "source '{}' has invalid subreddit '{subreddit}'; \
                             only ASCII letters, digits and '_' are allowed",
                            source.name
                        )));
                    }
                }
            }
        }

        if source.limit == Some(0) {
            return Err(ConfigError::Validation(format!(
                "source '{}' has limit 0; must be at least 1",
                source.name
            )));
        }

        if source.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(format!(
                "source '{}' has timeout_secs 0; must be at least 1",
                source.name
            )));
        }
    }

    if sources_file.total_weight() <= 0.0 {
        return Err(ConfigError::Validation(
            "source weights must sum to a positive total".to_string(),
        ));
    }

    Ok(())
}

/// Subreddit names are interpolated into the listing URL path.
fn is_valid_subreddit(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn normalize_weights(sources_file: &mut SourcesFile) {
    let total = sources_file.total_weight();
    if (total - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
        return;
    }

    tracing::info!(
        total_weight = total,
        sources = sources_file.sources.len(),
        "source weights do not sum to 1.0; rescaling"
    );
    for source in &mut sources_file.sources {
        source.weight /= total;
    }
}
