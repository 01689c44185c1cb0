//! Writer backend trait for report tables
//!
//! Every analysis output is a named table of JSON objects with a fixed column
//! list. Backends decide how a table is laid out on disk.

use serde_json::Value;

#[derive(Debug)]
pub enum ReportWriterError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Database(String),
    InvalidTable(String),
}

impl From<std::io::Error> for ReportWriterError {
    fn from(err: std::io::Error) -> Self {
        ReportWriterError::Io(err)
    }
}

impl From<serde_json::Error> for ReportWriterError {
    fn from(err: serde_json::Error) -> Self {
        ReportWriterError::Serialization(err)
    }
}

impl From<rusqlite::Error> for ReportWriterError {
    fn from(err: rusqlite::Error) -> Self {
        ReportWriterError::Database(err.to_string())
    }
}

impl std::fmt::Display for ReportWriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportWriterError::Io(e) => write!(f, "IO error: {}", e),
            ReportWriterError::Serialization(e) => write!(f, "Serialization error: {}", e),
            ReportWriterError::Database(e) => write!(f, "Database error: {}", e),
            ReportWriterError::InvalidTable(name) => write!(f, "Invalid table: {}", name),
        }
    }
}

impl std::error::Error for ReportWriterError {}

/// Backend trait for writing report tables
pub trait ReportWriterBackend {
    /// Write every row of one table, returning the number of rows written
    ///
    /// `columns` is the table schema. It holds even when `rows` is empty.
    fn write_table(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Value],
    ) -> Result<usize, ReportWriterError>;

    /// Flush pending writes to storage
    fn flush(&mut self) -> Result<(), ReportWriterError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}

/// Table and column names must be non-empty `[A-Za-z0-9_]` identifiers
pub fn validate_identifier(name: &str) -> Result<(), ReportWriterError> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(ReportWriterError::InvalidTable(name.to_string()))
    }
}
