/// Column names shared by ingestion, cleaning and reporting
pub const COLUMN_ID: &str = "id";
pub const COLUMN_TITLE: &str = "title";
pub const COLUMN_PRICE: &str = "price";
pub const COLUMN_CATEGORY: &str = "category";

/// Columns kept from the product API payload
pub const INGESTION_COLUMNS: [&str; 4] = [COLUMN_ID, COLUMN_TITLE, COLUMN_PRICE, COLUMN_CATEGORY];

/// Columns whose absence from a batch is fatal
pub const REQUIRED_COLUMNS: [&str; 2] = [COLUMN_TITLE, COLUMN_PRICE];

// Cleaning defaults
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const MIN_PRICE_EXCLUSIVE: f64 = 0.0;
pub const MAX_PRICE_INCLUSIVE: f64 = 10_000.0;
pub const TITLE_SHORT_LEN: usize = 100;

// Enrichment defaults
pub const SENTIMENT_MAX_CHARS: usize = 512;
pub const HF_API_TOKEN_ENV: &str = "HF_API_TOKEN";
pub const DEFAULT_SENTIMENT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/distilbert-base-uncased-finetuned-sst-2-english";

// Insight defaults
pub const POSITIVE_SHARE_THRESHOLD: f64 = 70.0;
pub const NEGATIVE_SHARE_THRESHOLD: f64 = 30.0;
pub const TITLE_PREVIEW_LEN: usize = 50;

// Product API defaults
pub const DEFAULT_API_BASE_URL: &str = "https://fakestoreapi.com";
pub const DEFAULT_PRODUCTS_ENDPOINT: &str = "/products";

/// Timestamp fragment used in artifact file names
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
