pub mod analyze_use_case;
pub mod clean_use_case;
pub mod ingest_use_case;
pub mod ports;

pub use analyze_use_case::{AnalyzeOutput, AnalyzeUseCase};
pub use clean_use_case::{CleanOutput, CleanUseCase};
pub use ingest_use_case::IngestUseCase;
