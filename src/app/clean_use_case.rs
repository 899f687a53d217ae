use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::app::ports::BatchOutputPort;
use crate::domain::{CleanBatch, RawBatch, RunContext};
use crate::observability::metrics;
use crate::pipeline::processing::cleaning::{Cleaner, CleaningAudit, RuleEffect};

/// Result of the cleaning stage
#[derive(Debug)]
pub struct CleanOutput {
    pub batch: CleanBatch,
    pub audit: CleaningAudit,
    pub path: PathBuf,
}

/// Cleans a raw batch, records per-rule metrics and saves the clean batch
pub struct CleanUseCase {
    cleaner: Cleaner,
    output: Arc<dyn BatchOutputPort>,
}

impl CleanUseCase {
    pub fn new(cleaner: Cleaner, output: Arc<dyn BatchOutputPort>) -> Self {
        Self { cleaner, output }
    }

    pub async fn clean(&self, ctx: &RunContext, raw: &RawBatch) -> Result<CleanOutput> {
        metrics::cleaning::batch_size(raw.len());
        let (batch, audit) = self.cleaner.clean(raw)?;

        for entry in &audit.entries {
            match entry.rule.effect() {
                RuleEffect::Removed => {
                    metrics::cleaning::rows_removed(entry.rule.as_str(), entry.affected)
                }
                RuleEffect::Repaired => {
                    metrics::cleaning::rows_repaired(entry.rule.as_str(), entry.affected)
                }
            }
        }

        let path = self.output.write_clean(ctx, &batch).await?;
        Ok(CleanOutput { batch, audit, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::PipelineError;
    use crate::domain::EnrichedBatch;
    use crate::pipeline::processing::cleaning::CleaningRule;
    use async_trait::async_trait;
    use serde_json::json;

    struct MockOutput {
        clean_rows: tokio::sync::Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl BatchOutputPort for MockOutput {
        async fn write_raw(&self, _ctx: &RunContext, _batch: &RawBatch) -> Result<PathBuf> {
            unimplemented!()
        }

        async fn write_clean(&self, _ctx: &RunContext, batch: &CleanBatch) -> Result<PathBuf> {
            self.clean_rows.lock().await.push(batch.len());
            Ok(PathBuf::from("clean.ndjson"))
        }

        async fn write_enriched(
            &self,
            _ctx: &RunContext,
            _batch: &EnrichedBatch,
        ) -> Result<PathBuf> {
            unimplemented!()
        }
    }

    fn use_case() -> (CleanUseCase, Arc<MockOutput>) {
        let output = Arc::new(MockOutput {
            clean_rows: tokio::sync::Mutex::new(Vec::new()),
        });
        (CleanUseCase::new(Cleaner::default(), output.clone()), output)
    }

    #[tokio::test]
    async fn test_clean_saves_batch_and_audit() {
        let (use_case, output) = use_case();
        let raw = RawBatch::from_json_array(json!([
            {"id": 1, "title": "Lamp", "price": 10.0, "category": "home"},
            {"id": 1, "title": "Lamp", "price": 10.0, "category": "home"},
            {"id": 2, "title": "Free", "price": 0, "category": "home"}
        ]))
        .unwrap();

        let result = use_case.clean(&RunContext::new(), &raw).await.unwrap();
        assert_eq!(result.batch.len(), 1);
        assert_eq!(result.audit.count(CleaningRule::DuplicatesRemoved), 1);
        assert_eq!(result.audit.count(CleaningRule::InvalidPriceRemoved), 1);
        assert_eq!(*output.clean_rows.lock().await, vec![1]);
    }

    #[tokio::test]
    async fn test_schema_error_stops_before_writing() {
        let (use_case, output) = use_case();
        let raw = RawBatch::from_json_array(json!([{"id": 1, "title": "No price"}])).unwrap();

        let err = use_case.clean(&RunContext::new(), &raw).await.unwrap_err();
        let pipeline_err = err.downcast_ref::<PipelineError>().unwrap();
        assert!(pipeline_err.is_schema());
        assert!(output.clean_rows.lock().await.is_empty());
    }
}
