//! Headline sentiment.
//!
//! A [`PolarityScorer`] maps text to a score in `[-1, 1]`; the
//! [`SentimentAggregator`] scores the newest few headlines and averages them.

pub mod lexicon;

use tracing::warn;

use crate::errors::ScoreError;
use crate::models::{Mood, NewsItem};
use crate::news::FeedEntry;

pub use lexicon::LexiconScorer;

/// Maps free text to a polarity in `[-1, 1]` (negative tone to positive tone).
///
/// Called once per headline per cycle, possibly from several tasks, so
/// implementations must not rely on mutable state.
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> Result<f64, ScoreError>;
}

impl<F> PolarityScorer for F
where
    F: Fn(&str) -> Result<f64, ScoreError> + Send + Sync,
{
    fn polarity(&self, text: &str) -> Result<f64, ScoreError> {
        self(text)
    }
}

/// Aggregate mood of one cycle's headlines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sentiment {
    /// Mean polarity, `0.0` when there were no headlines.
    pub score: f64,
    pub items: Vec<NewsItem>,
}

#[derive(Debug, Clone, Copy)]
pub struct SentimentAggregator {
    positive_threshold: f64,
    negative_threshold: f64,
}

impl SentimentAggregator {
    pub fn new(positive_threshold: f64, negative_threshold: f64) -> Self {
        Self {
            positive_threshold,
            negative_threshold,
        }
    }

    /// Scores the first `limit` headlines in feed order and averages them.
    ///
    /// A headline whose scoring fails counts as `0.0` instead of aborting the
    /// whole aggregation. Out-of-range scores are clamped to `[-1, 1]`.
    pub fn aggregate(
        &self,
        headlines: &[FeedEntry],
        scorer: &dyn PolarityScorer,
        limit: usize,
    ) -> Sentiment {
        let items: Vec<NewsItem> = headlines
            .iter()
            .take(limit)
            .map(|entry| {
                let polarity = score_or_neutral(scorer, &entry.title);
                NewsItem {
                    title: entry.title.clone(),
                    link: entry.link.clone(),
                    polarity,
                    mood_icon: self.classify(polarity),
                }
            })
            .collect();

        if items.is_empty() {
            return Sentiment::default();
        }
        let score = items.iter().map(|i| i.polarity).sum::<f64>() / items.len() as f64;
        Sentiment { score, items }
    }

    pub fn classify(&self, score: f64) -> Mood {
        Mood::classify(score, self.positive_threshold, self.negative_threshold)
    }
}

impl Default for SentimentAggregator {
    fn default() -> Self {
        Self::new(0.1, -0.1)
    }
}

fn score_or_neutral(scorer: &dyn PolarityScorer, title: &str) -> f64 {
    match scorer.polarity(title) {
        Ok(p) if p.is_finite() => p.clamp(-1.0, 1.0),
        Ok(p) => {
            warn!(title, polarity = p, "scorer returned a non-finite polarity, using 0");
            0.0
        }
        Err(err) => {
            warn!(title, error = %err, "scoring headline failed, using 0");
            0.0
        }
    }
}
