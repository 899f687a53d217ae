use serde_json::{json, Value};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use crate::common::error::{PipelineError, Result};
use crate::config::SentimentConfig;
use crate::domain::SentimentLabel;
use crate::pipeline::processing::enrich::{SentimentOutcome, SentimentScorer};

/// Scores text with a hosted text-classification model.
///
/// The request shape is the Hugging Face inference API: `POST {"inputs": text}` answered
/// by `[[{"label": "POSITIVE", "score": 0.99}, ...]]`. Scoring blocks on the runtime the
/// scorer was built in, so it must be called from a blocking thread.
pub struct RemoteSentimentScorer {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    runtime: Handle,
}

impl RemoteSentimentScorer {
    /// Build from config. The bearer token is read from the configured environment variable.
    pub fn from_config(config: &SentimentConfig) -> Result<Self> {
        let token = std::env::var(&config.api_token_env)?;
        let runtime = Handle::try_current().map_err(|e| {
            PipelineError::Config(format!("remote sentiment scorer needs a tokio runtime: {}", e))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token,
            runtime,
        })
    }

    async fn request(&self, text: &str) -> Result<Value> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "inputs": text }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::Api {
                message: format!("sentiment endpoint answered with HTTP {}", status.as_u16()),
            });
        }
        Ok(resp.json::<Value>().await?)
    }
}

impl SentimentScorer for RemoteSentimentScorer {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn score(&self, text: &str) -> SentimentOutcome {
        match self.runtime.block_on(self.request(text)) {
            Ok(body) => parse_classification(&body).unwrap_or_else(|| {
                debug!("Unexpected classification payload: {}", body);
                SentimentOutcome::Unavailable {
                    reason: "unexpected classification payload".to_string(),
                }
            }),
            Err(e) => SentimentOutcome::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

fn map_label(label: &str) -> SentimentLabel {
    match label.to_ascii_uppercase().as_str() {
        "POSITIVE" | "LABEL_1" | "POS" => SentimentLabel::Positive,
        "NEGATIVE" | "LABEL_0" | "NEG" => SentimentLabel::Negative,
        _ => SentimentLabel::Unknown,
    }
}

/// Pick the highest-scoring label from `[[{label, score}]]` or `[{label, score}]`
pub fn parse_classification(body: &Value) -> Option<SentimentOutcome> {
    let candidates = match body.as_array()?.first()? {
        Value::Array(inner) => inner.as_slice(),
        Value::Object(_) => body.as_array()?.as_slice(),
        _ => return None,
    };
    candidates
        .iter()
        .filter_map(|c| Some((c.get("label")?.as_str()?, c.get("score")?.as_f64()?)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(label, score)| SentimentOutcome::Scored {
            label: map_label(label),
            confidence: score,
        })
}
