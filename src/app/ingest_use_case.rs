use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use crate::app::ports::{BatchOutputPort, ProductSource};
use crate::domain::{RawBatch, RunContext};
use crate::observability::metrics;

/// Fetches the raw product batch and saves it as the run's first artifact
pub struct IngestUseCase {
    source: Box<dyn ProductSource>,
    output: Arc<dyn BatchOutputPort>,
}

impl IngestUseCase {
    pub fn new(source: Box<dyn ProductSource>, output: Arc<dyn BatchOutputPort>) -> Self {
        Self { source, output }
    }

    pub fn source_name(&self) -> &str {
        self.source.source_name()
    }

    pub async fn ingest(&self, ctx: &RunContext) -> Result<(RawBatch, PathBuf)> {
        let batch = match self.source.fetch_products().await {
            Ok(batch) => batch,
            Err(e) => {
                metrics::ingest::fetch_error(self.source.source_name());
                error!("❌ Fetching from {} failed: {}", self.source.source_name(), e);
                return Err(e.into());
            }
        };
        metrics::ingest::records_fetched(self.source.source_name(), batch.len());

        let path = self.output.write_raw(ctx, &batch).await?;
        Ok((batch, path))
    }
}
