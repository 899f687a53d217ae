//! Report payload handed to the report sink, and the dashboard document built from it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::{EnrichedBatch, SentimentLabel};
use crate::pipeline::processing::cleaning::CleaningAudit;
use crate::pipeline::processing::statistics::Statistics;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub cleaning: CleaningAudit,
    pub statistics: Statistics,
    pub insights: Vec<String>,
    pub records: EnrichedBatch,
}

impl AnalysisReport {
    /// Dashboard document: summary cards, category and sentiment tables, insights and
    /// one row per product.
    pub fn dashboard(&self) -> Value {
        let stats = &self.statistics;
        let share = |count: usize| {
            if stats.total_products == 0 {
                0.0
            } else {
                count as f64 / stats.total_products as f64 * 100.0
            }
        };

        let mut cards = vec![
            json!({"label": "Products analysed", "value": stats.total_products}),
            json!({"label": "Average price", "value": stats.avg_price, "unit": "$"}),
            json!({"label": "Median price", "value": stats.median_price, "unit": "$"}),
            json!({"label": "Insights", "value": self.insights.len()}),
        ];
        if let Some(pct) = stats.sentiment_share(SentimentLabel::Positive) {
            cards.push(json!({"label": "Positive titles", "value": pct, "unit": "%"}));
        }

        let categories: Vec<Value> = stats
            .categories
            .iter()
            .map(|(category, &count)| {
                json!({
                    "category": category,
                    "count": count,
                    "share_pct": share(count),
                    "avg_price": stats.avg_price_by_category.get(category),
                })
            })
            .collect();

        let sentiment: Vec<Value> = stats
            .sentiment_distribution
            .iter()
            .flatten()
            .map(|(label, &count)| {
                json!({
                    "label": label,
                    "count": count,
                    "share_pct": share(count),
                })
            })
            .collect();

        let products: Vec<Value> = self
            .records
            .records
            .iter()
            .map(|r| {
                json!({
                    "id": r.product.id,
                    "title": r.product.title_short,
                    "category": r.product.category,
                    "price": r.product.price,
                    "sentiment": r.sentiment.map(|s| s.label),
                    "sentiment_score": r.sentiment.map(|s| s.score),
                })
            })
            .collect();

        json!({
            "title": "Competitive Intelligence Dashboard",
            "run_id": self.run_id,
            "generated_at": self.generated_at,
            "summary": cards,
            "price": {
                "min": stats.min_price,
                "max": stats.max_price,
                "std": stats.std_price,
            },
            "cleaning": {
                "initial_rows": self.cleaning.initial_rows,
                "final_rows": self.cleaning.final_rows(),
                "counts": self.cleaning.counts(),
            },
            "categories": categories,
            "sentiment": sentiment,
            "insights": self.insights,
            "products": products,
        })
    }
}
