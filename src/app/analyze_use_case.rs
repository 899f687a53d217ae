use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use crate::app::ports::{BatchOutputPort, ReportSink};
use crate::domain::{CleanBatch, RunContext};
use crate::observability::metrics;
use crate::pipeline::processing::cleaning::CleaningAudit;
use crate::pipeline::processing::enrich::{Enricher, EnrichmentSummary};
use crate::pipeline::processing::insights::InsightGenerator;
use crate::pipeline::processing::report::AnalysisReport;
use crate::pipeline::processing::statistics::compute_statistics;

/// Result of the analysis stage
#[derive(Debug)]
pub struct AnalyzeOutput {
    pub report: AnalysisReport,
    pub enrichment: EnrichmentSummary,
    pub analyzed_path: PathBuf,
    pub dashboard_path: PathBuf,
}

/// Scores sentiment, computes statistics and insights, then hands the report to the sink
pub struct AnalyzeUseCase {
    enricher: Enricher,
    insights: InsightGenerator,
    output: Arc<dyn BatchOutputPort>,
    report_sink: Box<dyn ReportSink>,
}

impl AnalyzeUseCase {
    pub fn new(
        enricher: Enricher,
        insights: InsightGenerator,
        output: Arc<dyn BatchOutputPort>,
        report_sink: Box<dyn ReportSink>,
    ) -> Self {
        Self {
            enricher,
            insights,
            output,
            report_sink,
        }
    }

    pub async fn analyze(
        &self,
        ctx: &RunContext,
        batch: CleanBatch,
        cleaning: CleaningAudit,
    ) -> Result<AnalyzeOutput> {
        // Scorers may block on network calls
        let enricher = self.enricher.clone();
        let (enriched, enrichment) =
            tokio::task::spawn_blocking(move || enricher.enrich(&batch))
                .await
                .context("sentiment scoring task failed")?;
        if enrichment.unavailable > 0 {
            metrics::enrich::unavailable(self.enricher.scorer_name(), enrichment.unavailable);
        }

        let statistics = compute_statistics(&enriched);
        let insights = self.insights.generate(&enriched, &statistics);
        metrics::insights::generated(insights.len());

        let analyzed_path = self.output.write_enriched(ctx, &enriched).await?;

        let report = AnalysisReport {
            run_id: ctx.run_id,
            generated_at: Utc::now(),
            cleaning,
            statistics,
            insights,
            records: enriched,
        };
        let dashboard_path = self.report_sink.write_report(ctx, &report).await?;

        Ok(AnalyzeOutput {
            report,
            enrichment,
            analyzed_path,
            dashboard_path,
        })
    }
}
