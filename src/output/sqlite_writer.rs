//! SQLite writer - one database table per report table
//!
//! The caller declares the columns, so an empty table still gets created. Each
//! column is typed from its non-null values. Columns mixing text and numbers
//! (ratios that fall back to `n/a`) get NUMERIC affinity. Each table is
//! replaced on every run.

use super::writer_backend::{validate_identifier, ReportWriterBackend, ReportWriterError};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value};
use std::path::Path;

pub struct SqliteReportWriter {
    conn: Connection,
}

impl SqliteReportWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, ReportWriterError> {
        let db_path = db_path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        log::info!("✅ SQLite report database initialized: {}", db_path.display());

        Ok(Self { conn })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnType {
    Integer,
    Real,
    Text,
    Numeric,
}

impl ColumnType {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnType::Integer),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(ColumnType::Integer),
            Value::Number(_) => Some(ColumnType::Real),
            _ => Some(ColumnType::Text),
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnType::Integer, ColumnType::Real) | (ColumnType::Real, ColumnType::Integer) => {
                ColumnType::Real
            }
            _ => ColumnType::Numeric,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Numeric => "NUMERIC",
        }
    }
}

fn as_object<'a>(table: &str, row: &'a Value) -> Result<&'a Map<String, Value>, ReportWriterError> {
    row.as_object().ok_or_else(|| {
        ReportWriterError::InvalidTable(format!("{}: rows must be JSON objects", table))
    })
}

/// Declared columns typed from the rows' non-null values; untyped columns are TEXT
fn column_types<'c>(
    table: &str,
    columns: &[&'c str],
    rows: &[Value],
) -> Result<Vec<(&'c str, ColumnType)>, ReportWriterError> {
    if columns.is_empty() {
        return Err(ReportWriterError::InvalidTable(format!("{}: no columns", table)));
    }
    for name in columns {
        validate_identifier(name)?;
    }

    let mut types: Vec<Option<ColumnType>> = vec![None; columns.len()];
    for row in rows {
        for (key, value) in as_object(table, row)? {
            let idx = columns.iter().position(|name| *name == key.as_str()).ok_or_else(|| {
                ReportWriterError::InvalidTable(format!("{}: undeclared column {}", table, key))
            })?;
            types[idx] = match (types[idx], ColumnType::of(value)) {
                (Some(a), Some(b)) => Some(a.merge(b)),
                (a, b) => a.or(b),
            };
        }
    }

    Ok(columns
        .iter()
        .zip(types)
        .map(|(name, ty)| (*name, ty.unwrap_or(ColumnType::Text)))
        .collect())
}

fn to_sql_value(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(0.0)),
        },
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

impl ReportWriterBackend for SqliteReportWriter {
    fn write_table(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Value],
    ) -> Result<usize, ReportWriterError> {
        validate_identifier(table)?;
        let columns = column_types(table, columns, rows)?;

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{}\"", table))?;

        let column_defs: Vec<String> = columns
            .iter()
            .map(|(name, ty)| format!("\"{}\" {}", name, ty.sql()))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE \"{}\" ({})",
            table,
            column_defs.join(", ")
        ))?;

        let names: Vec<String> = columns.iter().map(|(name, _)| format!("\"{}\"", name)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let insert = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table,
            names.join(", "),
            placeholders.join(", ")
        );

        {
            let mut stmt = tx.prepare(&insert)?;
            for row in rows {
                let object = as_object(table, row)?;
                let values = columns.iter().map(|(name, _)| to_sql_value(object.get(*name)));
                stmt.execute(params_from_iter(values))?;
            }
        }

        tx.commit()?;

        log::debug!("✅ Wrote {} rows to SQLite table {}", rows.len(), table);
        Ok(rows.len())
    }

    fn flush(&mut self) -> Result<(), ReportWriterError> {
        // Every table commits its own transaction
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_sqlite_table_write() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reports.db");
        let mut writer = SqliteReportWriter::new(&db_path).unwrap();

        let rows = vec![
            json!({"category": "Bikes", "total_sales": 900.5, "total_orders": 3}),
            json!({"category": null, "total_sales": 100.0, "total_orders": 1}),
        ];
        let written = writer
            .write_table("category_sales", &["category", "total_sales", "total_orders"], &rows)
            .unwrap();
        assert_eq!(written, 2);

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM category_sales", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);

        let (sales, orders): (f64, i64) = conn
            .query_row(
                "SELECT total_sales, total_orders FROM category_sales WHERE category = 'Bikes'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(sales, 900.5);
        assert_eq!(orders, 3);

        let nulls: i64 = conn
            .query_row("SELECT COUNT(*) FROM category_sales WHERE category IS NULL", [], |row| row.get(0))
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn test_rewrite_replaces_table() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reports.db");
        let mut writer = SqliteReportWriter::new(&db_path).unwrap();

        let columns = ["segment", "total"];
        writer
            .write_table(
                "segments",
                &columns,
                &[json!({"segment": "VIP", "total": 1}), json!({"segment": "New", "total": 2})],
            )
            .unwrap();
        writer
            .write_table("segments", &columns, &[json!({"segment": "Regular", "total": 5})])
            .unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM segments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_na_strings_stored_in_numeric_column() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reports.db");
        let mut writer = SqliteReportWriter::new(&db_path).unwrap();

        let rows = vec![
            json!({"order_year": 2012, "pct_change": "n/a"}),
            json!({"order_year": 2013, "pct_change": 25.0}),
        ];
        writer.write_table("yoy", &["order_year", "pct_change"], &rows).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let first: String = conn
            .query_row("SELECT pct_change FROM yoy WHERE order_year = 2012", [], |row| row.get(0))
            .unwrap();
        assert_eq!(first, "n/a");

        let second: f64 = conn
            .query_row("SELECT pct_change FROM yoy WHERE order_year = 2013", [], |row| row.get(0))
            .unwrap();
        assert_eq!(second, 25.0);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let dir = tempdir().unwrap();
        let mut writer = SqliteReportWriter::new(dir.path().join("reports.db")).unwrap();

        let bad_table = writer.write_table("drop table", &["a"], &[json!({"a": 1})]);
        assert!(matches!(bad_table, Err(ReportWriterError::InvalidTable(_))));

        let bad_column = writer.write_table("ok", &["a\"b"], &[json!({"a\"b": 1})]);
        assert!(matches!(bad_column, Err(ReportWriterError::InvalidTable(_))));

        let undeclared = writer.write_table("ok", &["a"], &[json!({"a": 1, "b": 2})]);
        assert!(matches!(undeclared, Err(ReportWriterError::InvalidTable(_))));

        let no_columns = writer.write_table("ok", &[], &[]);
        assert!(matches!(no_columns, Err(ReportWriterError::InvalidTable(_))));

        let not_object = writer.write_table("ok", &["a"], &[json!([1, 2])]);
        assert!(matches!(not_object, Err(ReportWriterError::InvalidTable(_))));
    }

    #[test]
    fn test_empty_table_keeps_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reports.db");
        let mut writer = SqliteReportWriter::new(&db_path).unwrap();
        let columns = ["segment", "total"];

        writer
            .write_table("segments", &columns, &[json!({"segment": "VIP", "total": 1})])
            .unwrap();
        let written = writer.write_table("segments", &columns, &[]).unwrap();
        assert_eq!(written, 0);

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM segments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);

        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('segments')").unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(names, vec!["segment", "total"]);
    }

    #[test]
    fn test_wal_mode_enabled() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reports.db");
        let _writer = SqliteReportWriter::new(&db_path).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
    }
}
