//! Analytics - star schema reporting over the warehouse
//!
//! # Architecture
//!
//! ```text
//! Warehouse (customers, products, sales)
//!     ↓ joined_sales()
//! aggregate (group keys × measures)
//!     ↓
//! window (rank, running_total, period_over_period)
//!     ↓
//! segment / contribution / explore
//!     ↓
//! customer_report + product_report
//!     ↓
//! AnalyticsEngine → AnalysisOutput → ReportWriter
//! ```

pub mod aggregate;
pub mod contribution;
pub mod customer_report;
pub mod engine;
pub mod explore;
pub mod product_report;
pub mod ratio;
pub mod segment;
pub mod window;

pub use aggregate::{aggregate, activity_by, Activity, AggregateRow, GroupKey, KeyValue, Measure};
pub use contribution::{contribution, Contribution};
pub use customer_report::{build_customer_report, CustomerReportRow};
pub use engine::{AnalysisOutput, AnalyticsEngine};
pub use explore::{date_range, key_metrics, DateRange, KeyMetrics};
pub use product_report::{build_product_report, ProductReportRow};
pub use ratio::{safe_div, NOT_APPLICABLE};
pub use segment::{
    AgeGroup, CostBand, CustomerSegment, PerformanceTier, RuleSet, SegmentCount, SegmentThresholds,
};
pub use window::{
    period_over_period, rank, running_total, top_n, PeriodComparison, RankDirection, Ranked, Trend,
};
