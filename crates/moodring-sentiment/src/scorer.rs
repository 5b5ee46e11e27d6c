//! Text polarity scoring.

use vader_sentiment::SentimentIntensityAnalyzer;

/// Polarity scores for one piece of text.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolarityScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    /// Overall polarity in `[-1.0, 1.0]`.
    pub compound: f64,
}

/// Anything that can turn text into polarity scores.
pub trait TextScorer: Send + Sync {
    fn polarity_scores(&self, text: &str) -> PolarityScores;

    fn compound(&self, text: &str) -> f64 {
        self.polarity_scores(text).compound
    }
}

/// Lexicon scorer backed by VADER.
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextScorer for VaderScorer {
    fn polarity_scores(&self, text: &str) -> PolarityScores {
        if text.trim().is_empty() {
            return PolarityScores::default();
        }

        let scores = self.analyzer.polarity_scores(text);
        let get = |key: &str| scores.get(key).copied().unwrap_or(0.0);
        PolarityScores {
            positive: get("pos"),
            negative: get("neg"),
            neutral: get("neu"),
            compound: get("compound"),
        }
    }
}
