//! Shared scoring primitives and the analyzer trait.

use async_trait::async_trait;

use crate::error::SentimentError;
use crate::types::{Classification, SentimentResult};

/// Weight of a title's compound score when blended with its body.
pub const TITLE_WEIGHT: f64 = 0.6;
/// Weight of a body's compound score when blended with its title.
pub const BODY_WEIGHT: f64 = 0.4;

/// A sentiment source that produces a normalized [`SentimentResult`].
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    /// Fetch and score this source.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError`] when the source cannot be fetched or parsed.
    async fn analyze(&self) -> Result<SentimentResult, SentimentError>;

    /// Like [`SentimentAnalyzer::analyze`], but folds any failure into an
    /// `Error`-classified result instead of returning it.
    async fn get_sentiment(&self) -> SentimentResult {
        match self.analyze().await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(error = %e, "analyzer returned an error");
                SentimentResult::error(e.to_string())
            }
        }
    }
}

/// Linearly rescale `value` from `[old_min, old_max]` onto `[-1, 1]`.
///
/// Values outside the input range extrapolate; nothing is clamped.
///
/// # Errors
///
/// Returns [`SentimentError::InvalidRange`] when `old_min == old_max`.
pub fn normalize_score(value: f64, old_min: f64, old_max: f64) -> Result<f64, SentimentError> {
    #[allow(clippy::float_cmp)]
    if old_max == old_min {
        return Err(SentimentError::InvalidRange {
            min: old_min,
            max: old_max,
        });
    }
    Ok(2.0 * ((value - old_min) / (old_max - old_min)) - 1.0)
}

/// Map a normalized score to its band. Boundaries belong to the upper band:
/// `-0.6` is `Fear`, `0.2` is `Greed`.
#[must_use]
pub fn classify_sentiment(value: f64) -> Classification {
    if value < -0.6 {
        Classification::ExtremeFear
    } else if value < -0.2 {
        Classification::Fear
    } else if value < 0.2 {
        Classification::Neutral
    } else if value < 0.6 {
        Classification::Greed
    } else {
        Classification::ExtremeGreed
    }
}

/// Combine a title and body compound score.
#[must_use]
pub fn blend_compound(title: f64, body: f64) -> f64 {
    TITLE_WEIGHT * title + BODY_WEIGHT * body
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    Some(values.iter().sum::<f64>() / count)
}

/// `"positive"`, `"negative"` or `"neutral"` by the sign of `value`.
pub(crate) fn tone(value: f64) -> &'static str {
    if value > 0.0 {
        "positive"
    } else if value < 0.0 {
        "negative"
    } else {
        "neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl SentimentAnalyzer for Failing {
        async fn analyze(&self) -> Result<SentimentResult, SentimentError> {
            Err(SentimentError::Fetch {
                source_name: "index".to_string(),
                reason: "HTTP 503".to_string(),
            })
        }
    }

    #[test]
    fn normalize_maps_range_endpoints() {
        assert_eq!(normalize_score(0.0, 0.0, 100.0).unwrap(), -1.0);
        assert_eq!(normalize_score(50.0, 0.0, 100.0).unwrap(), 0.0);
        assert_eq!(normalize_score(100.0, 0.0, 100.0).unwrap(), 1.0);
    }

    #[test]
    fn normalize_is_monotonic_and_bounded_over_index_range() {
        let mut previous = f64::NEG_INFINITY;
        for step in 0..=10_000 {
            let raw = f64::from(step) / 100.0;
            let v = normalize_score(raw, 0.0, 100.0).unwrap();
            assert!((-1.0..=1.0).contains(&v), "{raw} mapped to {v}");
            assert!(v >= previous, "{raw} mapped to {v}, below {previous}");
            previous = v;
        }
    }

    #[test]
    fn normalize_extrapolates_outside_range() {
        let v = normalize_score(150.0, 0.0, 100.0).unwrap();
        assert!((v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_rejects_degenerate_range() {
        let err = normalize_score(5.0, 3.0, 3.0).unwrap_err();
        assert!(matches!(err, SentimentError::InvalidRange { .. }));
    }

    #[test]
    fn classify_boundaries_belong_to_upper_band() {
        assert_eq!(classify_sentiment(-0.6), Classification::Fear);
        assert_eq!(classify_sentiment(-0.2), Classification::Neutral);
        assert_eq!(classify_sentiment(0.2), Classification::Greed);
        assert_eq!(classify_sentiment(0.6), Classification::ExtremeGreed);
    }

    #[test]
    fn classify_partitions_the_full_range() {
        assert_eq!(classify_sentiment(-1.0), Classification::ExtremeFear);
        assert_eq!(classify_sentiment(-0.61), Classification::ExtremeFear);
        assert_eq!(classify_sentiment(-0.4), Classification::Fear);
        assert_eq!(classify_sentiment(0.0), Classification::Neutral);
        assert_eq!(classify_sentiment(0.19), Classification::Neutral);
        assert_eq!(classify_sentiment(0.5), Classification::Greed);
        assert_eq!(classify_sentiment(1.0), Classification::ExtremeGreed);
    }

    #[test]
    fn blend_weights_title_over_body() {
        assert!((blend_compound(1.0, 0.0) - 0.6).abs() < 1e-12);
        assert!((blend_compound(0.0, 1.0) - 0.4).abs() < 1e-12);
        assert!((blend_compound(0.5, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn mean_of_empty_slice_is_none() {
        assert_eq!(mean(&[]), None);
        assert!((mean(&[0.1, -0.1, 0.06]).unwrap() - 0.02).abs() < 1e-12);
    }

    #[tokio::test]
    async fn get_sentiment_folds_errors_into_error_result() {
        let result = Failing.get_sentiment().await;
        assert!(result.is_error());
        assert!(result.error_reason().unwrap().contains("HTTP 503"));
    }
}
