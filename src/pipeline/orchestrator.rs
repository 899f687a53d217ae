//! Runs the stages of one pipeline pass in strict order: ingestion, cleaning, analysis.
//! Any stage error aborts the run; nothing later runs and the failure is counted.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::ports::{BatchOutputPort, ProductSource, ReportSink};
use crate::app::{AnalyzeUseCase, CleanUseCase, IngestUseCase};
use crate::config::{Config, ReportFormat, SentimentProvider};
use crate::domain::RunContext;
use crate::infra::{
    JsonReportAdapter, NdjsonBatchAdapter, RemoteSentimentScorer, ReqwestHttp, XlsxReportAdapter,
};
use crate::observability::metrics;
use crate::pipeline::ingestion::ProductApiSource;
use crate::pipeline::processing::cleaning::{Cleaner, CleaningAudit};
use crate::pipeline::processing::enrich::{
    Enricher, LexiconScorer, SentimentScorer, UnavailableScorer,
};
use crate::pipeline::processing::insights::InsightGenerator;
use crate::pipeline::processing::inspect::inspect;

/// Artifacts written by a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilesCreated {
    pub raw: PathBuf,
    pub clean: PathBuf,
    pub analyzed: PathBuf,
    pub dashboard: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub duration: Duration,
    pub products_processed: usize,
    pub cleaning: CleaningAudit,
    pub insights: Vec<String>,
    pub files: FilesCreated,
}

pub struct PipelineOrchestrator {
    ingest: IngestUseCase,
    clean: CleanUseCase,
    analyze: AnalyzeUseCase,
}

impl PipelineOrchestrator {
    pub fn new(ingest: IngestUseCase, clean: CleanUseCase, analyze: AnalyzeUseCase) -> Self {
        Self {
            ingest,
            clean,
            analyze,
        }
    }

    /// Wire the production adapters: the configured product API, NDJSON batch files and
    /// the dashboard in the configured format.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = ReqwestHttp::with_timeout(Duration::from_secs(config.api.timeout_seconds))?;
        let source = ProductApiSource::new(config.api.products_url(), Arc::new(http));
        Ok(Self::with_source(config, Box::new(source)))
    }

    /// Same wiring as `from_config` with a caller-supplied product source
    pub fn with_source(config: &Config, source: Box<dyn ProductSource>) -> Self {
        let output = batch_output(config);
        Self::new(
            IngestUseCase::new(source, output.clone()),
            clean_use_case(config, output.clone()),
            analyze_use_case(config, output),
        )
    }

    /// Ingestion only; returns the number of products saved and the raw file
    pub async fn fetch(&self) -> Result<(usize, PathBuf)> {
        let ctx = RunContext::new();
        let (batch, path) = self.ingest.ingest(&ctx).await?;
        Ok((batch.len(), path))
    }

    pub async fn run(&self) -> Result<PipelineOutcome> {
        let ctx = RunContext::new();
        let started = Instant::now();
        info!(
            run_id = %ctx.run_id,
            source = self.ingest.source_name(),
            "🚀 Starting pipeline run"
        );

        let result = self.run_stages(&ctx, started).await;
        let elapsed = started.elapsed();
        metrics::pipeline::run_finished(result.is_ok(), elapsed);

        match &result {
            Ok(outcome) => {
                info!("✅ Pipeline completed in {:.2}s", elapsed.as_secs_f64());
                info!("   📊 Products processed: {}", outcome.products_processed);
                info!("   💡 Insights generated: {}", outcome.insights.len());
                info!("   📁 Raw: {}", outcome.files.raw.display());
                info!("   📁 Clean: {}", outcome.files.clean.display());
                info!("   📁 Analyzed: {}", outcome.files.analyzed.display());
                info!("   📁 Dashboard: {}", outcome.files.dashboard.display());
            }
            Err(e) => {
                error!(
                    "❌ Pipeline failed after {:.2}s: {:#}",
                    elapsed.as_secs_f64(),
                    e
                );
            }
        }
        result
    }

    async fn run_stages(&self, ctx: &RunContext, started: Instant) -> Result<PipelineOutcome> {
        info!("📥 STEP 1: Data ingestion");
        let (raw, raw_path) = self.ingest.ingest(ctx).await?;
        inspect(&raw).log("Raw batch");

        info!("🧹 STEP 2: Cleaning and validation");
        let cleaned = self.clean.clean(ctx, &raw).await?;
        inspect(&cleaned.batch.to_raw()).log("Clean batch");
        if cleaned.batch.is_empty() {
            warn!("⚠️  No products survived cleaning");
        }

        info!("🤖 STEP 3: Sentiment, statistics and insights");
        let products_processed = cleaned.batch.len();
        let analyzed = self
            .analyze
            .analyze(ctx, cleaned.batch, cleaned.audit)
            .await?;

        Ok(PipelineOutcome {
            run_id: ctx.run_id,
            duration: started.elapsed(),
            products_processed,
            cleaning: analyzed.report.cleaning,
            insights: analyzed.report.insights,
            files: FilesCreated {
                raw: raw_path,
                clean: cleaned.path,
                analyzed: analyzed.analyzed_path,
                dashboard: analyzed.dashboard_path,
            },
        })
    }
}

/// NDJSON batch files under the configured raw and processed directories
pub fn batch_output(config: &Config) -> Arc<dyn BatchOutputPort> {
    Arc::new(NdjsonBatchAdapter::new(
        &config.paths.raw_data,
        &config.paths.processed_data,
    ))
}

pub fn clean_use_case(config: &Config, output: Arc<dyn BatchOutputPort>) -> CleanUseCase {
    CleanUseCase::new(Cleaner::new(config.cleaning.clone()), output)
}

pub fn analyze_use_case(config: &Config, output: Arc<dyn BatchOutputPort>) -> AnalyzeUseCase {
    let enricher = Enricher::new(scorer_from_config(config), &config.sentiment);
    AnalyzeUseCase::new(
        enricher,
        InsightGenerator::new(config.insights.clone()),
        output,
        report_sink(config),
    )
}

/// Dashboard writer for the configured report format
pub fn report_sink(config: &Config) -> Box<dyn ReportSink> {
    match config.report.format {
        ReportFormat::Xlsx => Box::new(XlsxReportAdapter::new(&config.paths.output_data)),
        ReportFormat::Json => Box::new(JsonReportAdapter::new(&config.paths.output_data)),
    }
}

/// Pick the sentiment scorer. A remote scorer that cannot be built degrades to one that
/// reports every title as unavailable, so the run still completes.
pub fn scorer_from_config(config: &Config) -> Arc<dyn SentimentScorer> {
    match config.sentiment.provider {
        SentimentProvider::Lexicon => Arc::new(LexiconScorer),
        SentimentProvider::Remote => match RemoteSentimentScorer::from_config(&config.sentiment) {
            Ok(scorer) => {
                info!("🤖 Remote sentiment scorer at {}", config.sentiment.endpoint);
                Arc::new(scorer)
            }
            Err(e) => {
                warn!("⚠️  Remote sentiment scorer unavailable: {}", e);
                Arc::new(UnavailableScorer::new(e.to_string()))
            }
        },
    }
}
