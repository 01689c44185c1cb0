//! Report output backends
//!
//! ```text
//! AnalysisOutput → ReportWriter ─┬─ JsonlReportWriter  (<dir>/<table>.jsonl)
//!                                └─ SqliteReportWriter (one table per report)
//! ```

pub mod jsonl_writer;
pub mod sqlite_writer;
pub mod writer;
pub mod writer_backend;

pub use jsonl_writer::JsonlReportWriter;
pub use sqlite_writer::SqliteReportWriter;
pub use writer::{ReportRow, ReportWriter};
pub use writer_backend::{validate_identifier, ReportWriterBackend, ReportWriterError};
