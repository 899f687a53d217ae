// Adapters for the application ports

pub mod batch_output_adapter;
pub mod http_client;
pub mod report_output_adapter;
pub mod sentiment_http;
pub mod xlsx_report_adapter;

pub use batch_output_adapter::{read_clean_batch, NdjsonBatchAdapter};
pub use http_client::ReqwestHttp;
pub use report_output_adapter::JsonReportAdapter;
pub use sentiment_http::RemoteSentimentScorer;
pub use xlsx_report_adapter::XlsxReportAdapter;
