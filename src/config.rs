use crate::analytics::SegmentThresholds;
use chrono::{Local, NaiveDate};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendType {
    Jsonl,
    Sqlite,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse `--backend jsonl|sqlite` from an argument list, defaulting to JSONL
pub fn parse_backend_from_args<I, S>(args: I) -> BackendType
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<S> = args.into_iter().collect();
    if let Some(idx) = args.iter().position(|a| a.as_ref() == "--backend") {
        match args.get(idx + 1).map(|s| s.as_ref()) {
            Some("sqlite") => return BackendType::Sqlite,
            Some("jsonl") => return BackendType::Jsonl,
            other => {
                log::warn!("Unknown backend {:?}, defaulting to JSONL", other);
            }
        }
    }
    BackendType::Jsonl
}

/// Runtime configuration for a report run
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub backend: BackendType,
    pub customers_path: PathBuf,
    pub products_path: PathBuf,
    pub sales_path: PathBuf,
    /// Output directory (JSONL) or database file (SQLite)
    pub output_path: PathBuf,
    pub as_of: NaiveDate,
    pub thresholds: SegmentThresholds,
    pub top_n: usize,
    pub top_customers_n: usize,
    pub fewest_orders_n: usize,
}

impl AnalyticsConfig {
    /// Load from process environment and command line arguments
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = parse_backend_from_args(env::args());
        Self::from_lookup(backend, |key| env::var(key).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(backend: BackendType, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: &str| -> PathBuf {
            lookup(key).unwrap_or_else(|| default.to_string()).into()
        };

        let output_path = match backend {
            BackendType::Sqlite => path("SALESFLOW_DB_PATH", "data/salesflow.db"),
            BackendType::Jsonl => path("REPORTS_OUTPUT_PATH", "reports"),
        };

        let as_of = match lookup("AS_OF_DATE") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                ConfigError::InvalidValue(format!("AS_OF_DATE '{}' is not YYYY-MM-DD: {}", raw, e))
            })?,
            None => Local::now().date_naive(),
        };

        let defaults = SegmentThresholds::default();
        let thresholds = SegmentThresholds {
            vip_spending: parse_or(&lookup, "VIP_SPENDING_THRESHOLD", defaults.vip_spending),
            min_lifespan_months: parse_or(
                &lookup,
                "SEGMENT_MIN_LIFESPAN_MONTHS",
                defaults.min_lifespan_months,
            ),
            high_performer_sales: parse_or(&lookup, "HIGH_PERFORMER_SALES", defaults.high_performer_sales),
            mid_range_sales: parse_or(&lookup, "MID_RANGE_SALES", defaults.mid_range_sales),
            ..defaults
        };

        Ok(Self {
            backend,
            customers_path: path("CUSTOMERS_CSV_PATH", "datasets/gold.dim_customers.csv"),
            products_path: path("PRODUCTS_CSV_PATH", "datasets/gold.dim_products.csv"),
            sales_path: path("SALES_CSV_PATH", "datasets/gold.fact_sales.csv"),
            output_path,
            as_of,
            thresholds,
            top_n: parse_or(&lookup, "TOP_N", 5),
            top_customers_n: parse_or(&lookup, "TOP_CUSTOMERS_N", 10),
            fewest_orders_n: parse_or(&lookup, "FEWEST_ORDERS_N", 3),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {} '{}', defaulting to {}", key, raw, default);
            default
        }),
        None => default,
    }
}
