//! JSONL writer - one `<table>.jsonl` file per report table

use super::writer_backend::{validate_identifier, ReportWriterBackend, ReportWriterError};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub struct JsonlReportWriter {
    base_path: PathBuf,
    writers: HashMap<String, BufWriter<File>>,
}

impl JsonlReportWriter {
    pub fn new(base_path: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&base_path)?;
        log::info!("📝 Writing reports to: {}", base_path.display());

        Ok(Self {
            base_path,
            writers: HashMap::new(),
        })
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", table))
    }

    /// Files are truncated the first time a table is written in this run
    fn writer_for(&mut self, table: &str) -> std::io::Result<&mut BufWriter<File>> {
        if !self.writers.contains_key(table) {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(self.table_path(table))?;
            self.writers.insert(table.to_string(), BufWriter::new(file));
        }

        self.writers
            .get_mut(table)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "Writer not found"))
    }
}

impl ReportWriterBackend for JsonlReportWriter {
    fn write_table(
        &mut self,
        table: &str,
        _columns: &[&str],
        rows: &[Value],
    ) -> Result<usize, ReportWriterError> {
        validate_identifier(table)?;

        let writer = self.writer_for(table)?;
        for row in rows {
            serde_json::to_writer(&mut *writer, row)?;
            writer.write_all(b"\n")?;
        }

        log::debug!("✅ Wrote {} rows to {}.jsonl", rows.len(), table);
        Ok(rows.len())
    }

    fn flush(&mut self) -> Result<(), ReportWriterError> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }
}

impl Drop for JsonlReportWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
