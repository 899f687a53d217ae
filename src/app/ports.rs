use async_trait::async_trait;
use std::path::PathBuf;

use crate::common::error::Result;
use crate::domain::{CleanBatch, EnrichedBatch, RawBatch, RunContext};
use crate::pipeline::processing::report::AnalysisReport;

// Ingest-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Supplies the raw product batch for a run
#[async_trait]
pub trait ProductSource: Send + Sync {
    fn source_name(&self) -> &str;

    async fn fetch_products(&self) -> Result<RawBatch>;
}

// Output ports

/// Persists each stage's batch as the run's traceable artifacts
#[async_trait]
pub trait BatchOutputPort: Send + Sync {
    async fn write_raw(&self, ctx: &RunContext, batch: &RawBatch) -> anyhow::Result<PathBuf>;

    async fn write_clean(&self, ctx: &RunContext, batch: &CleanBatch) -> anyhow::Result<PathBuf>;

    async fn write_enriched(
        &self,
        ctx: &RunContext,
        batch: &EnrichedBatch,
    ) -> anyhow::Result<PathBuf>;
}

/// Renders the final report for people to read
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write_report(&self, ctx: &RunContext, report: &AnalysisReport)
        -> anyhow::Result<PathBuf>;
}
