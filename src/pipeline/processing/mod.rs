// Processing stages: inspection, cleaning, enrichment, aggregation and the report payload

pub mod cleaning;
pub mod enrich;
pub mod insights;
pub mod inspect;
pub mod report;
pub mod statistics;

pub use cleaning::{clean, Cleaner, CleaningAudit, CleaningRule};
pub use enrich::{Enricher, LexiconScorer, SentimentOutcome, SentimentScorer, UnavailableScorer};
pub use insights::{generate_insights, Insight, InsightGenerator};
pub use statistics::{compute_statistics, Statistics};
