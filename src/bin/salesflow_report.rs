//! Sales Report Binary - batch analytics over the gold-layer star schema
//!
//! Loads the customer, product and sales CSV exports, runs every analysis and
//! writes the resulting tables.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin salesflow_report -- --backend sqlite
//! ```
//!
//! ## Environment Variables
//!
//! - CUSTOMERS_CSV_PATH - Customer dimension (default: datasets/gold.dim_customers.csv)
//! - PRODUCTS_CSV_PATH - Product dimension (default: datasets/gold.dim_products.csv)
//! - SALES_CSV_PATH - Sales fact table (default: datasets/gold.fact_sales.csv)
//! - REPORTS_OUTPUT_PATH - JSONL output directory (default: reports)
//! - SALESFLOW_DB_PATH - SQLite database path (default: data/salesflow.db) - used when --backend sqlite
//! - AS_OF_DATE - Reference date for ages and recency, YYYY-MM-DD (default: today)
//! - VIP_SPENDING_THRESHOLD - VIP spend threshold (default: 5000)
//! - SEGMENT_MIN_LIFESPAN_MONTHS - Minimum lifespan for VIP/Regular (default: 12)
//! - HIGH_PERFORMER_SALES / MID_RANGE_SALES - Product revenue tiers (default: 50000 / 10000)
//! - TOP_N / TOP_CUSTOMERS_N / FEWEST_ORDERS_N - Ranking cut-offs (default: 5 / 10 / 3)
//! - RUST_LOG - Logging level (optional, default: info)

use salesflow::analytics::AnalyticsEngine;
use salesflow::config::AnalyticsConfig;
use salesflow::output::ReportWriter;
use salesflow::warehouse::load_warehouse;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = AnalyticsConfig::from_env()?;
    let started = Instant::now();

    log::info!("🚀 Starting sales report run");
    log::info!("   Customers: {}", config.customers_path.display());
    log::info!("   Products: {}", config.products_path.display());
    log::info!("   Sales: {}", config.sales_path.display());
    log::info!("   Output: {}", config.output_path.display());
    log::info!("   As of: {}", config.as_of);
    log::info!(
        "   VIP threshold: {} over {} months",
        config.thresholds.vip_spending,
        config.thresholds.min_lifespan_months
    );

    log::info!("📖 Loading warehouse...");
    let (warehouse, stats) = load_warehouse(
        &config.customers_path,
        &config.products_path,
        &config.sales_path,
    )?;
    if stats.total_skipped() > 0 {
        log::warn!("⚠️  Skipped {} malformed rows", stats.total_skipped());
    }

    let engine = AnalyticsEngine::from_config(&config);
    let output = engine.run(&warehouse);

    let mut writer = ReportWriter::new(config.backend, config.output_path.clone())?;
    log::info!("📊 Backend: {}", writer.backend_type());

    let rows = output.write(&mut writer)?;

    log::info!(
        "✅ Wrote {} rows across {} tables in {:.2?}",
        rows,
        salesflow::analytics::AnalysisOutput::TABLES.len(),
        started.elapsed()
    );

    Ok(())
}
