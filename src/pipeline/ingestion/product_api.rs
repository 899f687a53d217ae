use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::app::ports::{HttpClientPort, ProductSource};
use crate::common::constants::INGESTION_COLUMNS;
use crate::common::error::{PipelineError, Result};
use crate::domain::RawBatch;

/// Fetches product listings from a JSON API returning an array of product objects
pub struct ProductApiSource {
    url: String,
    http: Arc<dyn HttpClientPort>,
}

impl ProductApiSource {
    pub fn new(url: impl Into<String>, http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }
}

#[async_trait]
impl ProductSource for ProductApiSource {
    fn source_name(&self) -> &str {
        "product_api"
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_products(&self) -> Result<RawBatch> {
        info!("Sending request to product API");
        let response = self.http.get(&self.url).await?;

        if !(200..300).contains(&response.status) {
            return Err(PipelineError::Api {
                message: format!("{} answered with HTTP {}", self.url, response.status),
            });
        }
        debug!(
            "Received {} bytes ({})",
            response.bytes.len(),
            response.content_type
        );

        let payload: Value = serde_json::from_slice(&response.bytes)?;
        let batch = RawBatch::from_json_array(payload).map_err(|e| PipelineError::Api {
            message: format!("malformed product payload: {}", e),
        })?;

        // Only the ingestion columns travel downstream
        let batch = if batch.is_empty() {
            RawBatch::new(
                INGESTION_COLUMNS.iter().map(|c| c.to_string()).collect(),
                Vec::new(),
            )
        } else {
            batch.project(&INGESTION_COLUMNS)
        };

        info!("📊 {} products fetched", batch.len());
        Ok(batch)
    }
}

/// Reads a raw batch saved earlier, either a JSON array or one JSON object per line
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Parse a JSON array document or NDJSON text into raw rows
pub fn parse_rows(text: &str) -> Result<Vec<Value>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        Ok(serde_json::from_str::<Vec<Value>>(trimmed)?)
    } else {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str::<Value>(line).map_err(PipelineError::from))
            .collect()
    }
}

#[async_trait]
impl ProductSource for JsonFileSource {
    fn source_name(&self) -> &str {
        "json_file"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch_products(&self) -> Result<RawBatch> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let rows = parse_rows(&text)?;
        let batch =
            RawBatch::from_json_array(Value::Array(rows)).map_err(|e| PipelineError::Api {
                message: format!("malformed batch file {}: {}", self.path.display(), e),
            })?;
        info!("📂 {} rows loaded", batch.len());
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use serde_json::json;
    use std::io::Write;

    struct StubHttp {
        status: u16,
        body: Vec<u8>,
    }

    #[async_trait]
    impl HttpClientPort for StubHttp {
        async fn get(&self, _url: &str) -> Result<HttpGetResult> {
            Ok(HttpGetResult {
                status: self.status,
                bytes: self.body.clone(),
                content_type: "application/json".to_string(),
            })
        }
    }

    fn source(status: u16, body: Value) -> ProductApiSource {
        ProductApiSource::new(
            "http://stub/products",
            Arc::new(StubHttp {
                status,
                body: serde_json::to_vec(&body).unwrap(),
            }),
        )
    }

    #[tokio::test]
    async fn test_fetch_keeps_ingestion_columns() {
        let batch = source(
            200,
            json!([
                {"id": 1, "title": "Backpack", "price": 109.95, "category": "men's clothing",
                 "description": "Your perfect pack", "rating": {"rate": 3.9, "count": 120}},
                {"id": 2, "title": "T-Shirt", "price": 22.3, "category": "men's clothing"}
            ]),
        )
        .fetch_products()
        .await
        .unwrap();
        assert_eq!(batch.columns(), &["id", "title", "price", "category"]);
        assert_eq!(batch.len(), 2);
        assert!(batch.rows()[0].get("rating").is_none());
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let err = source(503, json!([])).fetch_products().await.unwrap_err();
        assert!(matches!(err, PipelineError::Api { .. }));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_api_error() {
        let err = source(200, json!({"products": []}))
            .fetch_products()
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Api { ref message } if message.contains("malformed")));
    }

    #[tokio::test]
    async fn test_empty_payload_declares_schema() {
        let batch = source(200, json!([])).fetch_products().await.unwrap();
        assert!(batch.is_empty());
        assert!(batch.has_column("price"));
    }

    #[tokio::test]
    async fn test_file_source_reads_ndjson() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", json!({"id": 1, "title": "A", "price": "3"})).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", json!({"id": 2, "title": "B", "price": 4})).unwrap();

        let batch = JsonFileSource::new(file.path()).fetch_products().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.columns(), &["id", "title", "price"]);
    }

    #[test]
    fn test_parse_rows_accepts_array_document() {
        let rows = parse_rows(" [{\"id\": 1}, {\"id\": 2}]").unwrap();
        assert_eq!(rows.len(), 2);
    }
}
