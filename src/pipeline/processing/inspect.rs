use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use crate::common::constants::COLUMN_PRICE;
use crate::domain::{field, RawBatch};
use crate::pipeline::processing::cleaning::rules::{coerce_price, row_fingerprint};

/// Missing-value tally for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingStat {
    pub count: usize,
    pub pct: f64,
}

/// Summary over the prices that coerce to a number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Shape and health of a raw batch, logged before and after cleaning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchDiagnostics {
    pub rows: usize,
    pub columns: Vec<String>,
    /// Only columns with at least one missing value
    pub missing: IndexMap<String, MissingStat>,
    pub duplicates: usize,
    pub price: Option<PriceSummary>,
}

impl BatchDiagnostics {
    pub fn log(&self, label: &str) {
        info!(
            "🔍 {}: {} rows × {} columns, {} duplicates",
            label,
            self.rows,
            self.columns.len(),
            self.duplicates
        );
        for (column, stat) in &self.missing {
            info!("   ❓ {}: {} missing ({:.1}%)", column, stat.count, stat.pct);
        }
        if let Some(price) = &self.price {
            info!(
                "   💲 price over {} values: mean {:.2}, min {:.2}, max {:.2}",
                price.count, price.mean, price.min, price.max
            );
        }
    }
}

/// Diagnose a raw batch. Never fails; an empty batch yields zeroes.
pub fn inspect(batch: &RawBatch) -> BatchDiagnostics {
    let rows = batch.len();

    let mut missing = IndexMap::new();
    for column in batch.columns() {
        let count = batch
            .rows()
            .iter()
            .filter(|row| field(row, column).is_none())
            .count();
        if count > 0 {
            missing.insert(
                column.clone(),
                MissingStat {
                    count,
                    pct: count as f64 / rows as f64 * 100.0,
                },
            );
        }
    }

    let mut seen = HashSet::with_capacity(rows);
    let duplicates = batch
        .rows()
        .iter()
        .filter(|row| !seen.insert(row_fingerprint(batch.columns(), row)))
        .count();

    let prices: Vec<f64> = batch
        .rows()
        .iter()
        .filter_map(|row| field(row, COLUMN_PRICE).and_then(coerce_price))
        .collect();
    let price = if prices.is_empty() {
        None
    } else {
        Some(PriceSummary {
            count: prices.len(),
            mean: prices.iter().sum::<f64>() / prices.len() as f64,
            min: prices.iter().copied().fold(f64::INFINITY, f64::min),
            max: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    };

    BatchDiagnostics {
        rows,
        columns: batch.columns().to_vec(),
        missing,
        duplicates,
        price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inspect_counts_missing_and_duplicates() {
        let batch = RawBatch::from_json_array(json!([
            {"id": 1, "title": "A", "price": "10", "category": null},
            {"id": 1, "title": "A", "price": "10", "category": null},
            {"id": 2, "title": null, "price": "N/A", "category": "x"},
            {"id": 3, "title": "C", "price": 30, "category": "y"}
        ]))
        .unwrap();
        let diag = inspect(&batch);
        assert_eq!(diag.rows, 4);
        assert_eq!(diag.duplicates, 1);
        assert_eq!(diag.missing["category"].count, 2);
        assert_eq!(diag.missing["title"].pct, 25.0);
        assert!(!diag.missing.contains_key("id"));
        let price = diag.price.unwrap();
        assert_eq!(price.count, 3);
        assert_eq!(price.min, 10.0);
        assert_eq!(price.max, 30.0);
    }

    #[test]
    fn test_inspect_empty_batch() {
        let diag = inspect(&RawBatch::default());
        assert_eq!(diag.rows, 0);
        assert!(diag.missing.is_empty());
        assert!(diag.price.is_none());
    }
}
