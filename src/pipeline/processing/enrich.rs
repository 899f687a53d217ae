use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::SentimentConfig;
use crate::domain::{CleanBatch, EnrichedBatch, EnrichedProduct, Sentiment, SentimentLabel};
use crate::pipeline::processing::cleaning::rules::truncate_chars;

/// Result of scoring one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SentimentOutcome {
    Scored {
        label: SentimentLabel,
        /// Classifier confidence in `label` (0.0 to 1.0)
        confidence: f64,
    },
    Unavailable {
        reason: String,
    },
}

/// Capability to classify the sentiment of a short text
pub trait SentimentScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, text: &str) -> SentimentOutcome;
}

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "amazing", "awesome", "beautiful", "best", "bright", "classic", "comfort",
        "comfortable", "cool", "cute", "durable", "easy", "elegant", "excellent", "fast",
        "fine", "free", "fresh", "gentle", "good", "gorgeous", "great", "happy", "ideal",
        "love", "lovely", "luxury", "nice", "perfect", "powerful", "premium", "pretty",
        "quality", "reliable", "safe", "smart", "soft", "solid", "stylish", "super",
        "sweet", "ultimate", "warm", "wonderful",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "awful", "bad", "broken", "cheap", "cheaply", "damaged", "defective", "dirty",
        "disappointing", "fake", "faulty", "flimsy", "fragile", "hard", "horrible", "junk",
        "leaky", "loose", "noisy", "old", "poor", "refurbished", "rough", "scratched",
        "slow", "terrible", "ugly", "used", "weak", "worst",
    ]
    .into_iter()
    .collect()
});

/// Offline word-list classifier.
///
/// Counts positive and negative words; the larger side wins with a Laplace-smoothed
/// confidence. Ties (including no sentiment words at all) lean positive at 0.5, like a
/// binary classifier on neutral product copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl SentimentScorer for LexiconScorer {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn score(&self, text: &str) -> SentimentOutcome {
        let mut positive = 0usize;
        let mut negative = 0usize;
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            if POSITIVE_WORDS.contains(word.as_str()) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(word.as_str()) {
                negative += 1;
            }
        }
        let label = if negative > positive {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Positive
        };
        let confidence = (positive.max(negative) + 1) as f64 / (positive + negative + 2) as f64;
        SentimentOutcome::Scored { label, confidence }
    }
}

/// Stand-in when no classifier could be set up; every text is unavailable
#[derive(Debug, Clone)]
pub struct UnavailableScorer {
    reason: String,
}

impl UnavailableScorer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SentimentScorer for UnavailableScorer {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn score(&self, _text: &str) -> SentimentOutcome {
        SentimentOutcome::Unavailable {
            reason: self.reason.clone(),
        }
    }
}

/// Per-batch enrichment summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentSummary {
    pub scored: usize,
    pub unavailable: usize,
}

/// Attaches a sentiment label and score to every record of a clean batch
#[derive(Clone)]
pub struct Enricher {
    scorer: Arc<dyn SentimentScorer>,
    max_chars: usize,
}

impl Enricher {
    pub fn new(scorer: Arc<dyn SentimentScorer>, config: &SentimentConfig) -> Self {
        Self {
            scorer,
            max_chars: config.max_chars,
        }
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Score every title. Unavailable outcomes become `UNKNOWN` with score 0.0.
    #[instrument(skip_all, fields(scorer = self.scorer.name(), rows = batch.len()))]
    pub fn enrich(&self, batch: &CleanBatch) -> (EnrichedBatch, EnrichmentSummary) {
        let mut summary = EnrichmentSummary::default();
        let records = batch
            .products
            .iter()
            .map(|product| {
                let text = truncate_chars(&product.title, self.max_chars);
                let sentiment = match self.scorer.score(&text) {
                    SentimentOutcome::Scored { label, confidence } => {
                        summary.scored += 1;
                        Sentiment {
                            label,
                            score: confidence,
                        }
                    }
                    SentimentOutcome::Unavailable { reason } => {
                        summary.unavailable += 1;
                        warn!(
                            "⚠️  Sentiment unavailable for '{}': {}",
                            truncate_chars(&product.title, 30),
                            reason
                        );
                        Sentiment {
                            label: SentimentLabel::Unknown,
                            score: 0.0,
                        }
                    }
                };
                EnrichedProduct {
                    product: product.clone(),
                    sentiment: Some(sentiment),
                }
            })
            .collect();
        info!(
            "✅ Sentiment analysis finished: {} scored, {} unavailable",
            summary.scored, summary.unavailable
        );
        (EnrichedBatch::new(records), summary)
    }
}
