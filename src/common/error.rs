use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input schema error: required column '{column}' is absent")]
    Schema { column: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl PipelineError {
    pub fn schema(column: impl Into<String>) -> Self {
        PipelineError::Schema {
            column: column.into(),
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, PipelineError::Schema { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
