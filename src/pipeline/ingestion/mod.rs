// Ingestion: product sources that produce the raw batch for a run

pub mod product_api;

pub use product_api::{JsonFileSource, ProductApiSource};
