//! Record and batch shapes that flow between pipeline stages.
//!
//! Each stage takes a batch by reference and returns a new one; nothing here is
//! mutated in place by a later stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use uuid::Uuid;

use crate::common::constants::{
    COLUMN_CATEGORY, COLUMN_ID, COLUMN_PRICE, COLUMN_TITLE, FILE_STAMP_FORMAT, INGESTION_COLUMNS,
};

/// One raw product row exactly as ingestion produced it
pub type RawRecord = Map<String, Value>;

/// An ordered batch of raw rows sharing one schema.
///
/// The schema is the declared column list. A row that lacks a declared column holds
/// a missing value for it, the same as an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBatch {
    columns: Vec<String>,
    rows: Vec<RawRecord>,
}

impl RawBatch {
    pub fn new(columns: Vec<String>, rows: Vec<RawRecord>) -> Self {
        Self { columns, rows }
    }

    /// Build a batch whose schema is the union of row keys, in first-seen order.
    pub fn from_records(rows: Vec<RawRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    /// Parse a JSON array of objects. Non-object elements are a payload error.
    pub fn from_json_array(value: Value) -> Result<Self, String> {
        let items = match value {
            Value::Array(items) => items,
            other => return Err(format!("expected a JSON array, got {}", json_kind(&other))),
        };
        let mut rows = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(map) => rows.push(map),
                other => {
                    return Err(format!(
                        "element {} is {}, expected an object",
                        idx,
                        json_kind(&other)
                    ))
                }
            }
        }
        Ok(Self::from_records(rows))
    }

    /// Keep only the listed columns that the batch actually has.
    pub fn project(&self, keep: &[&str]) -> Self {
        let columns: Vec<String> = keep
            .iter()
            .filter(|c| self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A field value counts as missing when the key is absent or holds `null`
pub fn field<'a>(row: &'a RawRecord, column: &str) -> Option<&'a Value> {
    match row.get(column) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Clean,
}

/// A validated, normalized product listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Opaque identifier; not required to be unique
    pub id: Value,
    pub title: String,
    pub title_short: String,
    pub price: f64,
    pub category: String,
    pub scraped_at: DateTime<Utc>,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanBatch {
    pub products: Vec<Product>,
}

impl CleanBatch {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Project the batch back onto the ingestion columns so it can be cleaned again.
    pub fn to_raw(&self) -> RawBatch {
        let columns = INGESTION_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = self
            .products
            .iter()
            .map(|p| {
                let mut row = RawRecord::new();
                row.insert(COLUMN_ID.to_string(), p.id.clone());
                row.insert(COLUMN_TITLE.to_string(), Value::String(p.title.clone()));
                row.insert(
                    COLUMN_PRICE.to_string(),
                    Number::from_f64(p.price).map(Value::Number).unwrap_or(Value::Null),
                );
                row.insert(COLUMN_CATEGORY.to_string(), Value::String(p.category.clone()));
                row
            })
            .collect();
        RawBatch::new(columns, rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    /// Scorer was unavailable for this text
    Unknown,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    #[serde(rename = "sentiment")]
    pub label: SentimentLabel,
    #[serde(rename = "sentiment_score")]
    pub score: f64,
}

/// A cleaned product plus the enrichment fields, which are absent before enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProduct {
    #[serde(flatten)]
    pub product: Product,
    #[serde(flatten)]
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBatch {
    pub records: Vec<EnrichedProduct>,
}

impl EnrichedBatch {
    pub fn new(records: Vec<EnrichedProduct>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True once the enrichment fields exist on the batch
    pub fn has_sentiment(&self) -> bool {
        self.records.iter().any(|r| r.sentiment.is_some())
    }
}

/// A clean batch that skipped enrichment
impl From<CleanBatch> for EnrichedBatch {
    fn from(batch: CleanBatch) -> Self {
        Self {
            records: batch
                .products
                .into_iter()
                .map(|product| EnrichedProduct {
                    product,
                    sentiment: None,
                })
                .collect(),
        }
    }
}

/// Identity and timing shared by every stage of one pipeline run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// File-name stamp, e.g. `20250820_134501`
    pub fn file_stamp(&self) -> String {
        self.started_at.format(FILE_STAMP_FORMAT).to_string()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_records_collects_columns_in_first_seen_order() {
        let batch = RawBatch::from_json_array(json!([
            {"id": 1, "title": "A"},
            {"price": 3.5, "id": 2}
        ]))
        .unwrap();
        assert_eq!(batch.columns(), &["id", "title", "price"]);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_from_json_array_rejects_non_objects() {
        let err = RawBatch::from_json_array(json!([{"id": 1}, 7])).unwrap_err();
        assert!(err.contains("element 1"));
        assert!(RawBatch::from_json_array(json!({"id": 1})).is_err());
    }

    #[test]
    fn test_project_keeps_present_ingestion_columns() {
        let batch = RawBatch::from_json_array(json!([
            {"id": 1, "title": "A", "price": 2, "rating": {"rate": 4.1}, "image": "x.png"}
        ]))
        .unwrap();
        let projected = batch.project(&INGESTION_COLUMNS);
        assert_eq!(projected.columns(), &["id", "title", "price"]);
        assert!(projected.rows()[0].get("rating").is_none());
    }

    #[test]
    fn test_field_treats_null_as_missing() {
        let row = json!({"title": null, "price": 1}).as_object().unwrap().clone();
        assert!(field(&row, "title").is_none());
        assert!(field(&row, "category").is_none());
        assert!(field(&row, "price").is_some());
    }

    #[test]
    fn test_enriched_product_serializes_flat_columns() {
        let record = EnrichedProduct {
            product: Product {
                id: json!(3),
                title: "Desk Lamp".to_string(),
                title_short: "Desk Lamp".to_string(),
                price: 12.5,
                category: "Home".to_string(),
                scraped_at: Utc::now(),
                data_quality: DataQuality::Clean,
            },
            sentiment: Some(Sentiment {
                label: SentimentLabel::Positive,
                score: 0.9,
            }),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sentiment"], "POSITIVE");
        assert_eq!(value["sentiment_score"], 0.9);
        assert_eq!(value["data_quality"], "clean");
        assert_eq!(value["category"], "Home");
    }
}
