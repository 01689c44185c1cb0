//! CSV loader for the three warehouse tables
//!
//! Rows that fail to deserialize are skipped and counted; only an unreadable
//! file aborts the load.

use super::model::{Customer, Product, SalesTransaction};
use super::Warehouse;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Csv(err)
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "IO error: {}", e),
            LoadError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

/// Rows read from one source
#[derive(Debug)]
pub struct TableLoad<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

/// Per-table load counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub customers_loaded: usize,
    pub customers_skipped: usize,
    pub products_loaded: usize,
    pub products_skipped: usize,
    pub sales_loaded: usize,
    pub sales_skipped: usize,
}

impl LoadStats {
    pub fn total_skipped(&self) -> usize {
        self.customers_skipped + self.products_skipped + self.sales_skipped
    }
}

/// Deserialize every record of a CSV stream, skipping malformed rows
pub fn read_records<T, R>(reader: R, source: &str) -> Result<TableLoad<T>, LoadError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Header problems surface here instead of once per row
    csv_reader.headers()?;

    let mut rows = Vec::new();
    let mut skipped = 0;

    for (idx, result) in csv_reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                // +2: header line plus 1-based numbering
                log::warn!("Skipping malformed row {} in {}: {}", idx + 2, source, e);
            }
        }
    }

    log::debug!("Read {} rows from {} ({} skipped)", rows.len(), source, skipped);

    Ok(TableLoad { rows, skipped })
}

pub fn read_csv_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<TableLoad<T>, LoadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    read_records(file, &path.display().to_string())
}

/// Load all three CSV sources and assemble the warehouse
pub fn load_warehouse(
    customers_path: impl AsRef<Path>,
    products_path: impl AsRef<Path>,
    sales_path: impl AsRef<Path>,
) -> Result<(Warehouse, LoadStats), LoadError> {
    let customers = read_csv_file::<Customer>(customers_path.as_ref())?;
    let products = read_csv_file::<Product>(products_path.as_ref())?;
    let sales = read_csv_file::<SalesTransaction>(sales_path.as_ref())?;

    let stats = LoadStats {
        customers_loaded: customers.rows.len(),
        customers_skipped: customers.skipped,
        products_loaded: products.rows.len(),
        products_skipped: products.skipped,
        sales_loaded: sales.rows.len(),
        sales_skipped: sales.skipped,
    };

    log::info!(
        "📥 Loaded {} customers, {} products, {} sales ({} malformed rows skipped)",
        stats.customers_loaded,
        stats.products_loaded,
        stats.sales_loaded,
        stats.total_skipped()
    );

    let warehouse = Warehouse::new(customers.rows, products.rows, sales.rows);
    Ok((warehouse, stats))
}
