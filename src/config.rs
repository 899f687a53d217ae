use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::common::constants::*;
use crate::common::error::{PipelineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Pipeline configuration. Loaded once by the binary and handed to each stage explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
    pub cleaning: CleaningConfig,
    pub sentiment: SentimentConfig,
    pub insights: InsightsConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub products_endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            products_endpoint: DEFAULT_PRODUCTS_ENDPOINT.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl ApiConfig {
    pub fn products_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.products_endpoint
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_data: PathBuf,
    pub processed_data: PathBuf,
    pub output_data: PathBuf,
    pub logs: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data: PathBuf::from("data/raw"),
            processed_data: PathBuf::from("data/processed"),
            output_data: PathBuf::from("data/output"),
            logs: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Business rules applied by the cleaning stage
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Prices must be strictly greater than this
    pub min_price_exclusive: f64,
    /// Prices must be less than or equal to this
    pub max_price_inclusive: f64,
    pub title_short_len: usize,
    /// Repair value for missing categories. Must already be title-cased.
    pub default_category: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_price_exclusive: MIN_PRICE_EXCLUSIVE,
            max_price_inclusive: MAX_PRICE_INCLUSIVE,
            title_short_len: TITLE_SHORT_LEN,
            default_category: UNCATEGORIZED.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentProvider {
    /// Offline word-list classifier
    Lexicon,
    /// Hosted text-classification endpoint
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub provider: SentimentProvider,
    pub endpoint: String,
    /// Name of the environment variable holding the endpoint's bearer token
    pub api_token_env: String,
    pub max_chars: usize,
    pub timeout_seconds: u64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            provider: SentimentProvider::Lexicon,
            endpoint: DEFAULT_SENTIMENT_ENDPOINT.to_string(),
            api_token_env: HF_API_TOKEN_ENV.to_string(),
            max_chars: SENTIMENT_MAX_CHARS,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Percentage of positive titles above which a positive insight is emitted
    pub positive_share_threshold: f64,
    /// Percentage of negative titles above which a warning is emitted
    pub negative_share_threshold: f64,
    pub title_preview_len: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            positive_share_threshold: POSITIVE_SHARE_THRESHOLD,
            negative_share_threshold: NEGATIVE_SHARE_THRESHOLD,
            title_preview_len: TITLE_PREVIEW_LEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Three-sheet workbook with charts
    Xlsx,
    /// Dashboard document as pretty JSON
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Xlsx,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file does not exist.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file '{}' not found, using default configuration",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn validate(&self) -> Result<()> {
        let cleaning = &self.cleaning;
        if cleaning.min_price_exclusive >= cleaning.max_price_inclusive {
            return Err(PipelineError::Config(format!(
                "cleaning.min_price_exclusive ({}) must be below cleaning.max_price_inclusive ({})",
                cleaning.min_price_exclusive, cleaning.max_price_inclusive
            )));
        }
        if cleaning.default_category.trim().is_empty() {
            return Err(PipelineError::Config(
                "cleaning.default_category must not be blank".to_string(),
            ));
        }
        if self.sentiment.max_chars == 0 {
            return Err(PipelineError::Config(
                "sentiment.max_chars must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.cleaning.max_price_inclusive, 10_000.0);
        assert_eq!(config.cleaning.default_category, "Uncategorized");
        assert_eq!(config.sentiment.provider, SentimentProvider::Lexicon);
        assert_eq!(config.api.products_url(), "https://fakestoreapi.com/products");
        assert_eq!(config.report.format, ReportFormat::Xlsx);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [api]
            base_url = "http://localhost:8080/"

            [sentiment]
            provider = "remote"

            [report]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.products_url(), "http://localhost:8080/products");
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.sentiment.provider, SentimentProvider::Remote);
        assert_eq!(config.sentiment.max_chars, 512);
        assert_eq!(config.report.format, ReportFormat::Json);
    }

    #[test]
    fn test_inverted_price_bounds_rejected() {
        let result = Config::from_toml_str(
            r#"
            [cleaning]
            min_price_exclusive = 100.0
            max_price_inclusive = 50.0
            "#,
        );
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default(Path::new("definitely/not/here.toml")).unwrap();
        assert_eq!(config.paths.logs, PathBuf::from("logs"));
    }
}
