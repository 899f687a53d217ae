use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::config::InsightsConfig;
use crate::domain::{EnrichedBatch, EnrichedProduct, SentimentLabel};
use crate::pipeline::processing::cleaning::rules::truncate_chars;
use crate::pipeline::processing::statistics::Statistics;

/// A derived observation. Rendered to text through `Display`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    PriceSkew { avg_price: f64, median_price: f64 },
    DominantCategory { category: String, count: usize, pct: f64 },
    PositiveSentiment { pct: f64 },
    NegativeSentiment { pct: f64 },
    MostExpensive { title: String, price: f64 },
    LeastExpensive { title: String, price: f64 },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::PriceSkew {
                avg_price,
                median_price,
            } => write!(
                f,
                "⚠️  Average price (${:.2}) is above the median price (${:.2}): a few very expensive products pull the average up",
                avg_price, median_price
            ),
            Insight::DominantCategory {
                category,
                count,
                pct,
            } => write!(
                f,
                "📦 Dominant category: '{}' with {} products ({:.1}%)",
                category, count, pct
            ),
            Insight::PositiveSentiment { pct } => {
                write!(f, "😊 Excellent! {:.1}% of products have a positive title", pct)
            }
            Insight::NegativeSentiment { pct } => {
                write!(f, "⚠️  Warning: {:.1}% of products have a negative title", pct)
            }
            Insight::MostExpensive { title, price } => {
                write!(f, "💰 Most expensive product: '{}...' at ${:.2}", title, price)
            }
            Insight::LeastExpensive { title, price } => {
                write!(f, "💵 Least expensive product: '{}...' at ${:.2}", title, price)
            }
        }
    }
}

/// Derives insights in a fixed order: price skew, dominant category, sentiment,
/// most expensive, least expensive. Each rule is independent and may emit nothing.
#[derive(Debug, Clone, Default)]
pub struct InsightGenerator {
    config: InsightsConfig,
}

impl InsightGenerator {
    pub fn new(config: InsightsConfig) -> Self {
        Self { config }
    }

    pub fn derive(&self, batch: &EnrichedBatch, stats: &Statistics) -> Vec<Insight> {
        let mut insights = Vec::new();

        if let (Some(avg_price), Some(median_price)) = (stats.avg_price, stats.median_price) {
            if avg_price > median_price {
                insights.push(Insight::PriceSkew {
                    avg_price,
                    median_price,
                });
            }
        }

        if let Some(insight) = self.dominant_category(stats) {
            insights.push(insight);
        }

        if let Some(insight) = self.sentiment(stats) {
            insights.push(insight);
        }

        if let Some(record) = extreme(batch, |candidate, best| candidate > best) {
            insights.push(Insight::MostExpensive {
                title: self.preview(record),
                price: record.product.price,
            });
        }
        if let Some(record) = extreme(batch, |candidate, best| candidate < best) {
            insights.push(Insight::LeastExpensive {
                title: self.preview(record),
                price: record.product.price,
            });
        }

        debug!("{} insights derived", insights.len());
        insights
    }

    /// Render the insights as text, in order.
    pub fn generate(&self, batch: &EnrichedBatch, stats: &Statistics) -> Vec<String> {
        let lines: Vec<String> = self
            .derive(batch, stats)
            .iter()
            .map(ToString::to_string)
            .collect();
        info!("💡 {} insights generated", lines.len());
        lines
    }

    fn dominant_category(&self, stats: &Statistics) -> Option<Insight> {
        if stats.total_products == 0 {
            return None;
        }
        let mut top: Option<(&String, usize)> = None;
        for (category, &count) in &stats.categories {
            // strictly greater keeps the first-seen category on ties
            if top.map_or(true, |(_, best)| count > best) {
                top = Some((category, count));
            }
        }
        top.map(|(category, count)| Insight::DominantCategory {
            category: category.clone(),
            count,
            pct: count as f64 / stats.total_products as f64 * 100.0,
        })
    }

    /// Positive is checked first; the negative warning only fires when it does not.
    fn sentiment(&self, stats: &Statistics) -> Option<Insight> {
        let positive = stats.sentiment_share(SentimentLabel::Positive)?;
        let negative = stats.sentiment_share(SentimentLabel::Negative)?;
        if positive > self.config.positive_share_threshold {
            Some(Insight::PositiveSentiment { pct: positive })
        } else if negative > self.config.negative_share_threshold {
            Some(Insight::NegativeSentiment { pct: negative })
        } else {
            None
        }
    }

    fn preview(&self, record: &EnrichedProduct) -> String {
        truncate_chars(&record.product.title, self.config.title_preview_len)
    }
}

/// First record whose price beats every earlier one under `better`
fn extreme(
    batch: &EnrichedBatch,
    better: impl Fn(f64, f64) -> bool,
) -> Option<&EnrichedProduct> {
    let mut best: Option<&EnrichedProduct> = None;
    for record in &batch.records {
        match best {
            Some(current) if !better(record.product.price, current.product.price) => {}
            _ => best = Some(record),
        }
    }
    best
}

/// Generate insights with the default thresholds.
pub fn generate_insights(batch: &EnrichedBatch, stats: &Statistics) -> Vec<String> {
    InsightGenerator::default().generate(batch, stats)
}
