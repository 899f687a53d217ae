use crate::app::ports::BatchOutputPort;
use crate::domain::{CleanBatch, EnrichedBatch, Product, RawBatch, RunContext};
use anyhow::Context;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// File-based implementation of BatchOutputPort.
/// Writes each batch as NDJSON, one record per line.
pub struct NdjsonBatchAdapter {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
}

impl NdjsonBatchAdapter {
    pub fn new(raw_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
        }
    }
}

#[async_trait::async_trait]
impl BatchOutputPort for NdjsonBatchAdapter {
    async fn write_raw(&self, ctx: &RunContext, batch: &RawBatch) -> anyhow::Result<PathBuf> {
        let path = self
            .raw_dir
            .join(format!("products_{}.ndjson", ctx.file_stamp()));
        write_ndjson(&path, batch.rows().iter())?;
        info!("💾 Raw batch saved: {}", path.display());
        Ok(path)
    }

    async fn write_clean(&self, ctx: &RunContext, batch: &CleanBatch) -> anyhow::Result<PathBuf> {
        let path = self
            .processed_dir
            .join(format!("products_clean_{}.ndjson", ctx.file_stamp()));
        write_ndjson(&path, batch.products.iter())?;
        info!("💾 Clean batch saved: {}", path.display());
        Ok(path)
    }

    async fn write_enriched(
        &self,
        ctx: &RunContext,
        batch: &EnrichedBatch,
    ) -> anyhow::Result<PathBuf> {
        let path = self
            .processed_dir
            .join(format!("products_analyzed_{}.ndjson", ctx.file_stamp()));
        write_ndjson(&path, batch.records.iter())?;
        info!("💾 Analyzed batch saved: {}", path.display());
        Ok(path)
    }
}

/// Write one JSON document per line, creating the parent directory if needed
pub fn write_ndjson<T: Serialize>(
    path: &Path,
    records: impl Iterator<Item = T>,
) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Load a clean batch written by `write_clean`
pub fn read_clean_batch(path: &Path) -> anyhow::Result<CleanBatch> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let products = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<Product>(line)
                .with_context(|| format!("{} line {}", path.display(), idx + 1))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(CleanBatch::new(products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::cleaning::clean;
    use serde_json::json;

    #[tokio::test]
    async fn test_clean_batch_written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = NdjsonBatchAdapter::new(dir.path().join("raw"), dir.path().join("processed"));
        let ctx = RunContext::new();

        let raw = RawBatch::from_json_array(json!([
            {"id": 1, "title": "Lamp", "price": "12.5", "category": "home"},
            {"id": 2, "title": "Desk", "price": 80, "category": null}
        ]))
        .unwrap();
        let raw_path = adapter.write_raw(&ctx, &raw).await.unwrap();
        assert_eq!(fs::read_to_string(&raw_path).unwrap().lines().count(), 2);

        let (batch, _) = clean(&raw).unwrap();
        let path = adapter.write_clean(&ctx, &batch).await.unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("products_clean_"));

        let loaded = read_clean_batch(&path).unwrap();
        assert_eq!(loaded, batch);
    }
}
