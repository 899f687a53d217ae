//! Cleaning & validation: turns a raw batch into a normalized batch plus an audit of
//! every removal and repair.
//!
//! Rules run in a fixed order and each count is measured against the batch the previous
//! rule produced:
//!
//! 1. exact-duplicate removal (full-row equality over the ingestion columns)
//! 2. missing price removal, then missing title removal
//! 3. category repair (missing becomes the default category)
//! 4. price coercion and range filter (one combined "invalid price" tally)
//! 5. category normalization (trim + title case)
//! 6. title normalization (trim + `title_short`)
//! 7. metadata stamping (`scraped_at`, `data_quality`)

pub mod audit;
pub mod rules;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::common::constants::{
    COLUMN_CATEGORY, COLUMN_ID, COLUMN_PRICE, COLUMN_TITLE, REQUIRED_COLUMNS,
};
use crate::common::error::{PipelineError, Result};
use crate::config::CleaningConfig;
use crate::domain::{field, CleanBatch, DataQuality, Product, RawBatch, RawRecord};

pub use audit::{AuditEntry, CleaningAudit, CleaningRule, RuleEffect};
use rules::{coerce_price, row_fingerprint, scalar_text, title_case, truncate_chars};

/// A row that survived the critical-field checks, before price validation
struct StagedRow<'a> {
    id: Value,
    title: String,
    price: &'a Value,
    category: Option<String>,
}

/// A row with a repaired category and a validated price
struct ValidRow {
    id: Value,
    title: String,
    price: f64,
    category: String,
}

/// Applies the cleaning rules with a given configuration
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    config: CleaningConfig,
}

impl Cleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    /// Clean a batch, stamping it with the current wall-clock time.
    pub fn clean(&self, raw: &RawBatch) -> Result<(CleanBatch, CleaningAudit)> {
        self.clean_at(raw, Utc::now())
    }

    /// Clean a batch, stamping every surviving record with `scraped_at`.
    #[instrument(skip_all, fields(rows = raw.len()))]
    pub fn clean_at(
        &self,
        raw: &RawBatch,
        scraped_at: DateTime<Utc>,
    ) -> Result<(CleanBatch, CleaningAudit)> {
        check_schema(raw)?;

        let mut audit = CleaningAudit::new(raw.len());

        let unique = remove_duplicates(raw, &mut audit);
        let staged = remove_missing_critical(unique, &mut audit);
        let repaired = self.repair_categories(staged, &mut audit);
        let valid = self.filter_invalid_prices(repaired, &mut audit);

        let products: Vec<Product> = valid
            .into_iter()
            .map(|row| self.normalize(row, scraped_at))
            .collect();

        info!(
            initial_rows = audit.initial_rows,
            final_rows = products.len(),
            removed = audit.total_removed(),
            "Cleaning finished: {} of {} rows removed ({:.1}%)",
            audit.total_removed(),
            audit.initial_rows,
            audit.removed_pct()
        );

        Ok((CleanBatch::new(products), audit))
    }

    fn repair_categories<'a>(
        &self,
        rows: Vec<StagedRow<'a>>,
        audit: &mut CleaningAudit,
    ) -> Vec<(StagedRow<'a>, String)> {
        let total = rows.len();
        let mut repaired = 0;
        let out: Vec<_> = rows
            .into_iter()
            .map(|mut row| {
                let category = match row.category.take() {
                    Some(c) if !c.trim().is_empty() => c,
                    _ => {
                        repaired += 1;
                        self.config.default_category.clone()
                    }
                };
                (row, category)
            })
            .collect();
        audit.record_repair(CleaningRule::CategoryRepaired, total, repaired);
        info!(
            "{} missing categories replaced with '{}'",
            repaired, self.config.default_category
        );
        out
    }

    fn filter_invalid_prices(
        &self,
        rows: Vec<(StagedRow<'_>, String)>,
        audit: &mut CleaningAudit,
    ) -> Vec<ValidRow> {
        let before = rows.len();
        let valid: Vec<ValidRow> = rows
            .into_iter()
            .filter_map(|(row, category)| {
                let price = coerce_price(row.price)?;
                if price <= self.config.min_price_exclusive
                    || price > self.config.max_price_inclusive
                {
                    debug!(price, "Dropping out-of-range price");
                    return None;
                }
                Some(ValidRow {
                    id: row.id,
                    title: row.title,
                    price,
                    category,
                })
            })
            .collect();
        let removed = before - valid.len();
        audit.record_removal(CleaningRule::InvalidPriceRemoved, before, removed);
        info!("{} invalid prices removed", removed);
        valid
    }

    fn normalize(&self, row: ValidRow, scraped_at: DateTime<Utc>) -> Product {
        let category = title_case(row.category.trim());
        let title = row.title.trim().to_string();
        let title_short = truncate_chars(&title, self.config.title_short_len);
        Product {
            id: row.id,
            title,
            title_short,
            price: row.price,
            category,
            scraped_at,
            data_quality: DataQuality::Clean,
        }
    }
}

/// Clean with the default rules.
pub fn clean(raw: &RawBatch) -> Result<(CleanBatch, CleaningAudit)> {
    Cleaner::default().clean(raw)
}

/// A batch with neither rows nor a declared schema is an empty input, not a schema error.
fn check_schema(raw: &RawBatch) -> Result<()> {
    if raw.is_empty() && raw.columns().is_empty() {
        return Ok(());
    }
    for column in REQUIRED_COLUMNS {
        if !raw.has_column(column) {
            return Err(PipelineError::schema(column));
        }
    }
    Ok(())
}

fn remove_duplicates<'a>(raw: &'a RawBatch, audit: &mut CleaningAudit) -> Vec<&'a RawRecord> {
    let mut seen = HashSet::with_capacity(raw.len());
    let unique: Vec<&RawRecord> = raw
        .rows()
        .iter()
        .filter(|row| seen.insert(row_fingerprint(raw.columns(), row)))
        .collect();
    let removed = raw.len() - unique.len();
    audit.record_removal(CleaningRule::DuplicatesRemoved, raw.len(), removed);
    info!("{} duplicates removed", removed);
    unique
}

fn remove_missing_critical<'a>(
    rows: Vec<&'a RawRecord>,
    audit: &mut CleaningAudit,
) -> Vec<StagedRow<'a>> {
    let before = rows.len();
    let priced: Vec<&RawRecord> = rows
        .into_iter()
        .filter(|row| field(row, COLUMN_PRICE).is_some())
        .collect();
    let removed = before - priced.len();
    audit.record_removal(CleaningRule::MissingPriceRemoved, before, removed);
    info!("{} rows without price removed", removed);

    let before = priced.len();
    let titled: Vec<StagedRow<'a>> = priced
        .into_iter()
        .filter_map(|row| {
            let title = field(row, COLUMN_TITLE)
                .and_then(scalar_text)
                .filter(|t| !t.trim().is_empty())?;
            let price = field(row, COLUMN_PRICE)?;
            Some(StagedRow {
                id: row.get(COLUMN_ID).cloned().unwrap_or(Value::Null),
                title,
                price,
                category: field(row, COLUMN_CATEGORY).and_then(scalar_text),
            })
        })
        .collect();
    let removed = before - titled.len();
    audit.record_removal(CleaningRule::MissingTitleRemoved, before, removed);
    info!("{} rows without title removed", removed);

    titled
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn batch(value: serde_json::Value) -> RawBatch {
        RawBatch::from_json_array(value)
            .unwrap()
            .project(&crate::common::constants::INGESTION_COLUMNS)
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_whitespace_and_type_variants_are_not_duplicates() {
        let raw = batch(json!([
            {"id": 1, "title": "  Widget A ", "price": "19.99", "category": null},
            {"id": 1, "title": "Widget A", "price": 19.99, "category": "tools"}
        ]));
        let (clean, audit) = Cleaner::default().clean_at(&raw, fixed_time()).unwrap();

        assert_eq!(audit.count(CleaningRule::DuplicatesRemoved), 0);
        assert_eq!(audit.count(CleaningRule::CategoryRepaired), 1);
        assert_eq!(clean.len(), 2);
        assert_eq!(clean.products[0].title, "Widget A");
        assert_eq!(clean.products[0].price, 19.99);
        assert_eq!(clean.products[0].category, "Uncategorized");
        assert_eq!(clean.products[1].category, "Tools");
    }

    #[test]
    fn test_exact_duplicates_keep_first() {
        let raw = batch(json!([
            {"id": 1, "title": "Lamp", "price": 10, "category": "home"},
            {"id": 2, "title": "Desk", "price": 80, "category": "home"},
            {"id": 1, "title": "Lamp", "price": 10, "category": "home"}
        ]));
        let (clean, audit) = clean(&raw).unwrap();
        assert_eq!(audit.count(CleaningRule::DuplicatesRemoved), 1);
        let ids: Vec<_> = clean.products.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_price_range_boundaries() {
        let raw = batch(json!([
            {"id": 1, "title": "Free", "price": "0", "category": "a"},
            {"id": 2, "title": "Yacht", "price": "15000", "category": "a"},
            {"id": 3, "title": "Car", "price": "9999.99", "category": "a"},
            {"id": 4, "title": "Cap", "price": 10000, "category": "a"},
            {"id": 5, "title": "Debt", "price": -3, "category": "a"}
        ]));
        let (clean, audit) = clean(&raw).unwrap();
        assert_eq!(audit.count(CleaningRule::InvalidPriceRemoved), 3);
        let prices: Vec<f64> = clean.products.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![9999.99, 10000.0]);
    }

    #[test]
    fn test_non_numeric_price_counts_as_invalid_not_missing() {
        let raw = batch(json!([
            {"id": 1, "title": "Mystery", "price": "N/A", "category": "a"},
            {"id": 2, "title": "Nothing", "price": null, "category": "a"}
        ]));
        let (clean, audit) = clean(&raw).unwrap();
        assert!(clean.is_empty());
        assert_eq!(audit.count(CleaningRule::MissingPriceRemoved), 1);
        assert_eq!(audit.count(CleaningRule::InvalidPriceRemoved), 1);
    }

    #[test]
    fn test_row_missing_both_fields_counted_by_price_pass_only() {
        let raw = batch(json!([
            {"id": 1, "title": null, "price": null, "category": "a"},
            {"id": 2, "title": "   ", "price": 5, "category": "a"},
            {"id": 3, "title": "Ok", "price": 5, "category": "a"}
        ]));
        let (clean, audit) = clean(&raw).unwrap();
        assert_eq!(audit.count(CleaningRule::MissingPriceRemoved), 1);
        assert_eq!(audit.count(CleaningRule::MissingTitleRemoved), 1);
        assert_eq!(clean.len(), 1);
    }

    #[test]
    fn test_missing_price_column_is_schema_error() {
        let raw = batch(json!([{"id": 1, "title": "No price", "category": "a"}]));
        let err = clean(&raw).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column } if column == "price"));
    }

    #[test]
    fn test_missing_title_column_is_schema_error() {
        let raw = RawBatch::new(vec!["id".into(), "price".into()], Vec::new());
        assert!(clean(&raw).unwrap_err().is_schema());
    }

    #[test]
    fn test_empty_batch_is_valid() {
        let (clean, audit) = clean(&RawBatch::default()).unwrap();
        assert!(clean.is_empty());
        assert!(audit.counts().values().all(|&c| c == 0));
        assert_eq!(audit.counts().len(), 5);
    }

    #[test]
    fn test_title_short_and_metadata() {
        let long_title = format!("  {}  ", "x".repeat(150));
        let raw = batch(json!([
            {"id": 1, "title": long_title, "price": 5, "category": "  HOME decor "}
        ]));
        let (clean, _) = Cleaner::default().clean_at(&raw, fixed_time()).unwrap();
        let product = &clean.products[0];
        assert_eq!(product.title.chars().count(), 150);
        assert_eq!(product.title_short.chars().count(), 100);
        assert_eq!(product.category, "Home Decor");
        assert_eq!(product.scraped_at, fixed_time());
        assert_eq!(product.data_quality, DataQuality::Clean);
    }

    #[test]
    fn test_custom_bounds_and_default_category() {
        let config = CleaningConfig {
            max_price_inclusive: 100.0,
            default_category: "Misc".to_string(),
            ..CleaningConfig::default()
        };
        let raw = batch(json!([
            {"id": 1, "title": "A", "price": 150, "category": null},
            {"id": 2, "title": "B", "price": 50}
        ]));
        let (clean, audit) = Cleaner::new(config).clean(&raw).unwrap();
        assert_eq!(audit.count(CleaningRule::InvalidPriceRemoved), 1);
        assert_eq!(clean.products[0].category, "Misc");
    }
}
