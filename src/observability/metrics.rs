//! Metrics catalog for the pipeline.
//!
//! Every metric name lives in `MetricName` so call sites never spell raw strings.
//! Without an installed recorder the `metrics` macros are no-ops, which keeps tests quiet.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion
    IngestRecords,
    IngestErrors,

    // Cleaning
    CleaningRowsRemoved,
    CleaningRowsRepaired,
    CleaningBatchSize,

    // Enrichment
    EnrichUnavailable,

    // Insights
    InsightsGenerated,

    // Whole run
    PipelineRuns,
    PipelineDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestRecords => "market_watch_ingest_records_total",
            MetricName::IngestErrors => "market_watch_ingest_errors_total",
            MetricName::CleaningRowsRemoved => "market_watch_cleaning_rows_removed_total",
            MetricName::CleaningRowsRepaired => "market_watch_cleaning_rows_repaired_total",
            MetricName::CleaningBatchSize => "market_watch_cleaning_batch_size",
            MetricName::EnrichUnavailable => "market_watch_enrich_unavailable_total",
            MetricName::InsightsGenerated => "market_watch_insights_generated",
            MetricName::PipelineRuns => "market_watch_pipeline_runs_total",
            MetricName::PipelineDuration => "market_watch_pipeline_duration_seconds",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            IngestRecords,
            IngestErrors,
            CleaningRowsRemoved,
            CleaningRowsRepaired,
            CleaningBatchSize,
            EnrichUnavailable,
            InsightsGenerated,
            PipelineRuns,
            PipelineDuration,
        ]
        .into_iter()
    }

    pub fn is_histogram(&self) -> bool {
        matches!(
            self,
            MetricName::CleaningBatchSize
                | MetricName::InsightsGenerated
                | MetricName::PipelineDuration
        )
    }

    /// (phase, description, unit)
    pub fn metadata(&self) -> (&'static str, &'static str, Option<&'static str>) {
        match self {
            MetricName::IngestRecords => ("ingest", "Product records fetched", None),
            MetricName::IngestErrors => ("ingest", "Failed product fetches", None),
            MetricName::CleaningRowsRemoved => ("cleaning", "Rows removed by rule", None),
            MetricName::CleaningRowsRepaired => ("cleaning", "Rows repaired by rule", None),
            MetricName::CleaningBatchSize => ("cleaning", "Rows entering cleaning", None),
            MetricName::EnrichUnavailable => {
                ("enrich", "Titles the scorer could not classify", None)
            }
            MetricName::InsightsGenerated => ("insights", "Insights produced per run", None),
            MetricName::PipelineRuns => ("pipeline", "Pipeline runs by outcome", None),
            MetricName::PipelineDuration => ("pipeline", "Pipeline run duration", Some("s")),
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice is an error from the exporter.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    for metric in MetricName::all_metrics() {
        let (phase, description, _) = metric.metadata();
        let description = format!("[{}] {}", phase, description);
        if metric.is_histogram() {
            ::metrics::describe_histogram!(metric.as_str(), description);
        } else {
            ::metrics::describe_counter!(metric.as_str(), description);
        }
    }
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Render the current metrics in Prometheus text format, if a recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Ingest Metrics
// ============================================================================

pub mod ingest {
    use super::MetricName;

    pub fn records_fetched(source: &str, count: usize) {
        ::metrics::counter!(MetricName::IngestRecords.as_str(), "source" => source.to_string())
            .increment(count as u64);
    }

    pub fn fetch_error(source: &str) {
        ::metrics::counter!(MetricName::IngestErrors.as_str(), "source" => source.to_string())
            .increment(1);
    }
}

// ============================================================================
// Cleaning Metrics
// ============================================================================

pub mod cleaning {
    use super::MetricName;

    pub fn rows_removed(rule: &'static str, count: usize) {
        ::metrics::counter!(MetricName::CleaningRowsRemoved.as_str(), "rule" => rule)
            .increment(count as u64);
    }

    pub fn rows_repaired(rule: &'static str, count: usize) {
        ::metrics::counter!(MetricName::CleaningRowsRepaired.as_str(), "rule" => rule)
            .increment(count as u64);
    }

    pub fn batch_size(rows: usize) {
        ::metrics::histogram!(MetricName::CleaningBatchSize.as_str()).record(rows as f64);
    }
}

// ============================================================================
// Enrichment Metrics
// ============================================================================

pub mod enrich {
    use super::MetricName;

    pub fn unavailable(scorer: &'static str, count: usize) {
        ::metrics::counter!(MetricName::EnrichUnavailable.as_str(), "scorer" => scorer)
            .increment(count as u64);
    }
}

// ============================================================================
// Insight Metrics
// ============================================================================

pub mod insights {
    use super::MetricName;

    pub fn generated(count: usize) {
        ::metrics::histogram!(MetricName::InsightsGenerated.as_str()).record(count as f64);
    }
}

// ============================================================================
// Pipeline Metrics
// ============================================================================

pub mod pipeline {
    use super::{Duration, MetricName};

    pub fn run_finished(success: bool, elapsed: Duration) {
        let outcome = if success { "success" } else { "failure" };
        ::metrics::counter!(MetricName::PipelineRuns.as_str(), "outcome" => outcome).increment(1);
        ::metrics::histogram!(MetricName::PipelineDuration.as_str())
            .record(elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_and_prefixed() {
        let names: HashSet<_> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        assert_eq!(names.len(), MetricName::all_metrics().count());
        assert!(names.iter().all(|n| n.starts_with("market_watch_")));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        cleaning::rows_removed("duplicates_removed", 3);
        pipeline::run_finished(true, Duration::from_millis(5));
        assert!(render().is_none());
    }
}
