//! Unified writer interface for report tables
//!
//! Routes writes to either JSONL or SQLite backend based on configuration.

use super::jsonl_writer::JsonlReportWriter;
use super::sqlite_writer::SqliteReportWriter;
use super::writer_backend::{ReportWriterBackend, ReportWriterError};
use crate::config::BackendType;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// A serializable row with a fixed column list
///
/// `columns` names every key the row serializes to, in table order.
pub trait ReportRow: Serialize {
    fn columns() -> Vec<&'static str>;
}

/// Unified writer that routes to either JSONL or SQLite backend
pub enum ReportWriter {
    Jsonl(JsonlReportWriter),
    Sqlite(SqliteReportWriter),
}

impl ReportWriter {
    /// `path` is the output directory for JSONL, the database file for SQLite
    pub fn new(backend: BackendType, path: PathBuf) -> Result<Self, ReportWriterError> {
        match backend {
            BackendType::Jsonl => Ok(ReportWriter::Jsonl(JsonlReportWriter::new(path)?)),
            BackendType::Sqlite => Ok(ReportWriter::Sqlite(SqliteReportWriter::new(path)?)),
        }
    }

    fn backend(&mut self) -> &mut dyn ReportWriterBackend {
        match self {
            ReportWriter::Jsonl(w) => w,
            ReportWriter::Sqlite(w) => w,
        }
    }

    /// Serialize `rows` and write them as one table with `T`'s columns
    pub fn write_rows<T: ReportRow>(
        &mut self,
        table: &str,
        rows: &[T],
    ) -> Result<usize, ReportWriterError> {
        let values = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?;
        self.write_table(table, &T::columns(), &values)
    }

    pub fn write_table(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Value],
    ) -> Result<usize, ReportWriterError> {
        self.backend().write_table(table, columns, rows)
    }

    pub fn flush(&mut self) -> Result<(), ReportWriterError> {
        self.backend().flush()
    }

    /// Get backend type for logging
    pub fn backend_type(&self) -> &'static str {
        match self {
            ReportWriter::Jsonl(w) => w.backend_type(),
            ReportWriter::Sqlite(w) => w.backend_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        total: f64,
    }

    impl ReportRow for Row {
        fn columns() -> Vec<&'static str> {
            vec!["name", "total"]
        }
    }

    #[test]
    fn test_write_rows_jsonl() {
        let dir = tempdir().unwrap();
        let mut writer = ReportWriter::new(BackendType::Jsonl, dir.path().to_path_buf()).unwrap();
        assert_eq!(writer.backend_type(), "JSONL");

        let written = writer
            .write_rows("totals", &[Row { name: "a", total: 1.5 }])
            .unwrap();
        writer.flush().unwrap();

        assert_eq!(written, 1);
        let content = std::fs::read_to_string(dir.path().join("totals.jsonl")).unwrap();
        assert_eq!(content.trim(), r#"{"name":"a","total":1.5}"#);
    }

    #[test]
    fn test_write_rows_sqlite() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("reports.db");
        let mut writer = ReportWriter::new(BackendType::Sqlite, db_path.clone()).unwrap();
        assert_eq!(writer.backend_type(), "SQLite");

        writer
            .write_rows("totals", &[Row { name: "a", total: 1.5 }, Row { name: "b", total: 2.0 }])
            .unwrap();

        let conn = rusqlite::Connection::open(&db_path).unwrap();
        let sum: f64 = conn
            .query_row("SELECT SUM(total) FROM totals", [], |row| row.get(0))
            .unwrap();
        assert_eq!(sum, 3.5);
    }

    #[test]
    fn test_write_no_rows_sqlite() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reports.db");
        let mut writer = ReportWriter::new(BackendType::Sqlite, db_path.clone()).unwrap();

        let rows: Vec<Row> = Vec::new();
        assert_eq!(writer.write_rows("totals", &rows).unwrap(), 0);

        let conn = rusqlite::Connection::open(&db_path).unwrap();
        let (count, sum): (i64, Option<f64>) = conn
            .query_row("SELECT COUNT(*), SUM(total) FROM totals", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(sum, None);
    }
}
