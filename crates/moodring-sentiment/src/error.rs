use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("failed to fetch {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("no sentiment results available")]
    NoData,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot normalize over an empty range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },

    #[error("history store error at {path}: {reason}")]
    History { path: String, reason: String },
}

impl SentimentError {
    pub(crate) fn fetch(source_name: &str, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<moodring_core::ConfigError> for SentimentError {
    fn from(err: moodring_core::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
