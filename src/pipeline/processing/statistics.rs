use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::{EnrichedBatch, SentimentLabel};

/// Read-only summary of a batch, recomputed every run.
///
/// Price metrics are `None` on an empty batch; `std_price` is `None` below two rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_products: usize,
    pub avg_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Sample standard deviation (n - 1 denominator)
    pub std_price: Option<f64>,
    /// Category to product count, in first-seen order
    pub categories: IndexMap<String, usize>,
    pub avg_price_by_category: IndexMap<String, f64>,
    /// Present only once the batch carries sentiment
    pub sentiment_distribution: Option<IndexMap<SentimentLabel, usize>>,
    /// Mean sentiment score; 0.0 without sentiment
    pub avg_sentiment_score: f64,
    pub sentiment_by_category: Option<IndexMap<String, IndexMap<SentimentLabel, usize>>>,
}

impl Statistics {
    /// Share of products carrying `label`, as a percentage
    pub fn sentiment_share(&self, label: SentimentLabel) -> Option<f64> {
        let distribution = self.sentiment_distribution.as_ref()?;
        if self.total_products == 0 {
            return None;
        }
        let count = distribution.get(&label).copied().unwrap_or(0);
        Some(count as f64 / self.total_products as f64 * 100.0)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation; undefined for fewer than two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Compute the batch summary.
#[instrument(skip_all, fields(rows = batch.len()))]
pub fn compute_statistics(batch: &EnrichedBatch) -> Statistics {
    let prices: Vec<f64> = batch.records.iter().map(|r| r.product.price).collect();

    let mut categories: IndexMap<String, usize> = IndexMap::new();
    let mut price_sums: IndexMap<String, f64> = IndexMap::new();
    for record in &batch.records {
        let category = &record.product.category;
        *categories.entry(category.clone()).or_insert(0) += 1;
        *price_sums.entry(category.clone()).or_insert(0.0) += record.product.price;
    }
    let avg_price_by_category = price_sums
        .into_iter()
        .map(|(category, sum)| {
            let count = categories[&category];
            (category, sum / count as f64)
        })
        .collect();

    let (sentiment_distribution, avg_sentiment_score, sentiment_by_category) =
        if batch.has_sentiment() {
            let mut distribution: IndexMap<SentimentLabel, usize> = IndexMap::new();
            let mut by_category: IndexMap<String, IndexMap<SentimentLabel, usize>> =
                IndexMap::new();
            let mut scores = Vec::with_capacity(batch.len());
            for record in &batch.records {
                if let Some(sentiment) = record.sentiment {
                    *distribution.entry(sentiment.label).or_insert(0) += 1;
                    *by_category
                        .entry(record.product.category.clone())
                        .or_default()
                        .entry(sentiment.label)
                        .or_insert(0) += 1;
                    scores.push(sentiment.score);
                }
            }
            (
                Some(distribution),
                mean(&scores).unwrap_or(0.0),
                Some(by_category),
            )
        } else {
            (None, 0.0, None)
        };

    let stats = Statistics {
        total_products: batch.len(),
        avg_price: mean(&prices),
        median_price: median(&prices),
        min_price: prices.iter().copied().reduce(f64::min),
        max_price: prices.iter().copied().reduce(f64::max),
        std_price: sample_std(&prices),
        categories,
        avg_price_by_category,
        sentiment_distribution,
        avg_sentiment_score,
        sentiment_by_category,
    };
    info!(
        "📊 Statistics computed: {} products, {} categories",
        stats.total_products,
        stats.categories.len()
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataQuality, EnrichedProduct, Product, Sentiment};
    use chrono::Utc;
    use serde_json::json;

    fn record(
        category: &str,
        price: f64,
        sentiment: Option<(SentimentLabel, f64)>,
    ) -> EnrichedProduct {
        EnrichedProduct {
            product: Product {
                id: json!(null),
                title: format!("{} item", category),
                title_short: format!("{} item", category),
                price,
                category: category.to_string(),
                scraped_at: Utc::now(),
                data_quality: DataQuality::Clean,
            },
            sentiment: sentiment.map(|(label, score)| Sentiment { label, score }),
        }
    }

    #[test]
    fn test_price_metrics() {
        let batch = EnrichedBatch::new(vec![
            record("Tools", 10.0, None),
            record("Tools", 20.0, None),
            record("Home", 30.0, None),
            record("Home", 100.0, None),
        ]);
        let stats = compute_statistics(&batch);
        assert_eq!(stats.total_products, 4);
        assert_eq!(stats.avg_price, Some(40.0));
        assert_eq!(stats.median_price, Some(25.0));
        assert_eq!(stats.min_price, Some(10.0));
        assert_eq!(stats.max_price, Some(100.0));
        // deviations: -30, -20, -10, 60 -> 5000 / 3
        let expected_std = (5000.0f64 / 3.0).sqrt();
        assert!((stats.std_price.unwrap() - expected_std).abs() < 1e-9);
        assert_eq!(stats.categories["Tools"], 2);
        assert_eq!(stats.avg_price_by_category["Home"], 65.0);
        assert!(stats.sentiment_distribution.is_none());
        assert_eq!(stats.avg_sentiment_score, 0.0);
    }

    #[test]
    fn test_single_row_std_is_undefined() {
        let batch = EnrichedBatch::new(vec![record("Tools", 10.0, None)]);
        let stats = compute_statistics(&batch);
        assert_eq!(stats.std_price, None);
        assert_eq!(stats.median_price, Some(10.0));
    }

    #[test]
    fn test_empty_batch_has_no_price_metrics() {
        let stats = compute_statistics(&EnrichedBatch::default());
        assert_eq!(stats.total_products, 0);
        assert!(stats.avg_price.is_none());
        assert!(stats.max_price.is_none());
        assert!(stats.categories.is_empty());
        assert!(stats.sentiment_share(SentimentLabel::Positive).is_none());
    }

    #[test]
    fn test_sentiment_distribution() {
        let batch = EnrichedBatch::new(vec![
            record("Tools", 10.0, Some((SentimentLabel::Positive, 0.9))),
            record("Tools", 20.0, Some((SentimentLabel::Negative, 0.7))),
            record("Home", 30.0, Some((SentimentLabel::Positive, 0.8))),
            record("Home", 40.0, Some((SentimentLabel::Unknown, 0.0))),
        ]);
        let stats = compute_statistics(&batch);
        let distribution = stats.sentiment_distribution.as_ref().unwrap();
        assert_eq!(distribution[&SentimentLabel::Positive], 2);
        assert_eq!(distribution[&SentimentLabel::Negative], 1);
        assert!((stats.avg_sentiment_score - 0.6).abs() < 1e-9);
        assert_eq!(stats.sentiment_share(SentimentLabel::Positive), Some(50.0));
        let by_category = stats.sentiment_by_category.as_ref().unwrap();
        assert_eq!(by_category["Home"][&SentimentLabel::Unknown], 1);
        assert!(by_category["Tools"].get(&SentimentLabel::Unknown).is_none());
    }

    #[test]
    fn test_categories_keep_first_seen_order() {
        let batch = EnrichedBatch::new(vec![
            record("Jewelery", 5.0, None),
            record("Electronics", 5.0, None),
            record("Jewelery", 5.0, None),
        ]);
        let stats = compute_statistics(&batch);
        let keys: Vec<_> = stats.categories.keys().cloned().collect();
        assert_eq!(keys, vec!["Jewelery", "Electronics"]);
    }
}
