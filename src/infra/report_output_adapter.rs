use crate::app::ports::ReportSink;
use crate::domain::RunContext;
use crate::pipeline::processing::report::AnalysisReport;
use anyhow::Context;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Writes the dashboard document as pretty JSON into the output directory
pub struct JsonReportAdapter {
    output_dir: PathBuf,
}

impl JsonReportAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait::async_trait]
impl ReportSink for JsonReportAdapter {
    async fn write_report(
        &self,
        ctx: &RunContext,
        report: &AnalysisReport,
    ) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;
        let path = self
            .output_dir
            .join(format!("dashboard_{}.json", ctx.file_stamp()));
        let json_string = serde_json::to_string_pretty(&report.dashboard())?;
        fs::write(&path, json_string).with_context(|| format!("writing {}", path.display()))?;
        info!("📊 Dashboard written: {}", path.display());
        Ok(path)
    }
}
