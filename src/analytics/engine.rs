//! Analytics engine - runs every analysis over a warehouse and collects the
//! output tables
//!
//! Each table is a plain `Vec` of serializable rows; `AnalysisOutput::write`
//! sends them to a report backend under a stable table name.

use super::aggregate::{aggregate, AggregateRow, GroupKey, KeyValue, Measure};
use super::contribution::{contribution, Contribution};
use super::customer_report::{build_customer_report, CustomerReportRow};
use super::explore::{date_range, key_metrics, DateRange, KeyMetrics};
use super::product_report::{build_product_report, ProductReportRow};
use super::segment::{
    cost_band_counts, customer_segment_counts, segment_customers, segment_products, SegmentCount,
    SegmentThresholds,
};
use super::window::{
    period_over_period, rank, running_total, top_n, PeriodComparison, RankDirection, Ranked,
};
use crate::config::AnalyticsConfig;
use crate::output::{ReportRow, ReportWriter, ReportWriterError};
use crate::warehouse::{JoinedSale, Warehouse};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlySales {
    pub order_year: i64,
    pub total_sales: f64,
    pub total_customers: usize,
    pub total_quantity: i64,
}

impl ReportRow for YearlySales {
    fn columns() -> Vec<&'static str> {
        vec!["order_year", "total_sales", "total_customers", "total_quantity"]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub order_year: i64,
    pub order_month: i64,
    pub total_sales: f64,
    pub total_customers: usize,
    pub total_quantity: i64,
}

impl ReportRow for MonthlySales {
    fn columns() -> Vec<&'static str> {
        vec!["order_year", "order_month", "total_sales", "total_customers", "total_quantity"]
    }
}

/// Monthly sales with running totals that restart every year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeMonth {
    pub order_year: i64,
    pub order_date: NaiveDate,
    pub total_sales: f64,
    pub running_total_sales: f64,
    pub avg_price: f64,
    pub moving_average_price: f64,
}

impl ReportRow for CumulativeMonth {
    fn columns() -> Vec<&'static str> {
        vec![
            "order_year",
            "order_date",
            "total_sales",
            "running_total_sales",
            "avg_price",
            "moving_average_price",
        ]
    }
}

/// Yearly sales of one product; the key tells apart products sharing a name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductYear {
    pub order_year: i64,
    pub product_key: i64,
    pub product_name: Option<String>,
    #[serde(skip)]
    pub total_sales: f64,
}

impl ReportRow for ProductYear {
    fn columns() -> Vec<&'static str> {
        vec!["order_year", "product_key", "product_name"]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRevenue {
    pub product_key: i64,
    pub product_name: Option<String>,
    pub total_sales: f64,
}

impl ReportRow for ProductRevenue {
    fn columns() -> Vec<&'static str> {
        vec!["product_key", "product_name", "total_sales"]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRevenue {
    pub customer_key: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub total_sales: f64,
}

impl ReportRow for CustomerRevenue {
    fn columns() -> Vec<&'static str> {
        vec!["customer_key", "first_name", "last_name", "total_sales"]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerOrders {
    pub customer_key: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub total_orders: usize,
}

impl ReportRow for CustomerOrders {
    fn columns() -> Vec<&'static str> {
        vec!["customer_key", "first_name", "last_name", "total_orders"]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySales {
    pub category: Option<String>,
    #[serde(skip)]
    pub total_sales: f64,
}

impl ReportRow for CategorySales {
    fn columns() -> Vec<&'static str> {
        vec!["category"]
    }
}

/// Every table produced by one engine run
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub key_metrics: KeyMetrics,
    pub date_range: DateRange,
    pub sales_by_year: Vec<YearlySales>,
    pub sales_by_month: Vec<MonthlySales>,
    pub cumulative_monthly_sales: Vec<CumulativeMonth>,
    pub yearly_product_performance: Vec<PeriodComparison<ProductYear>>,
    pub top_products: Vec<Ranked<ProductRevenue>>,
    pub bottom_products: Vec<Ranked<ProductRevenue>>,
    pub top_customers: Vec<Ranked<CustomerRevenue>>,
    pub fewest_orders_customers: Vec<Ranked<CustomerOrders>>,
    pub category_contribution: Vec<Contribution<CategorySales>>,
    pub customer_segments: Vec<SegmentCount>,
    pub product_cost_bands: Vec<SegmentCount>,
    pub customer_report: Vec<CustomerReportRow>,
    pub product_report: Vec<ProductReportRow>,
}

impl AnalysisOutput {
    pub const TABLES: [&'static str; 15] = [
        "key_metrics",
        "date_range",
        "sales_by_year",
        "sales_by_month",
        "cumulative_monthly_sales",
        "yearly_product_performance",
        "top_products",
        "bottom_products",
        "top_customers",
        "fewest_orders_customers",
        "category_contribution",
        "customer_segments",
        "product_cost_bands",
        "customer_report",
        "product_report",
    ];

    /// Write every table, returning the total number of rows written
    pub fn write(&self, writer: &mut ReportWriter) -> Result<usize, ReportWriterError> {
        let [key_metrics, date_range, by_year, by_month, cumulative, yearly_products, top_products, bottom_products, top_customers, fewest_orders, categories, segments, cost_bands, customer_report, product_report] =
            Self::TABLES;

        let counts = [
            writer.write_rows(key_metrics, std::slice::from_ref(&self.key_metrics))?,
            writer.write_rows(date_range, std::slice::from_ref(&self.date_range))?,
            writer.write_rows(by_year, &self.sales_by_year)?,
            writer.write_rows(by_month, &self.sales_by_month)?,
            writer.write_rows(cumulative, &self.cumulative_monthly_sales)?,
            writer.write_rows(yearly_products, &self.yearly_product_performance)?,
            writer.write_rows(top_products, &self.top_products)?,
            writer.write_rows(bottom_products, &self.bottom_products)?,
            writer.write_rows(top_customers, &self.top_customers)?,
            writer.write_rows(fewest_orders, &self.fewest_orders_customers)?,
            writer.write_rows(categories, &self.category_contribution)?,
            writer.write_rows(segments, &self.customer_segments)?,
            writer.write_rows(cost_bands, &self.product_cost_bands)?,
            writer.write_rows(customer_report, &self.customer_report)?,
            writer.write_rows(product_report, &self.product_report)?,
        ];
        writer.flush()?;

        for (table, rows) in Self::TABLES.iter().zip(counts) {
            log::info!("   {:<28} {:>6} rows", table, rows);
        }

        Ok(counts.iter().sum())
    }
}

pub struct AnalyticsEngine {
    thresholds: SegmentThresholds,
    as_of: NaiveDate,
    top_n: usize,
    top_customers_n: usize,
    fewest_orders_n: usize,
}

impl AnalyticsEngine {
    pub fn new(thresholds: SegmentThresholds, as_of: NaiveDate) -> Self {
        Self {
            thresholds,
            as_of,
            top_n: 5,
            top_customers_n: 10,
            fewest_orders_n: 3,
        }
    }

    pub fn with_limits(mut self, top_n: usize, top_customers_n: usize, fewest_orders_n: usize) -> Self {
        self.top_n = top_n;
        self.top_customers_n = top_customers_n;
        self.fewest_orders_n = fewest_orders_n;
        self
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.thresholds.clone(), config.as_of).with_limits(
            config.top_n,
            config.top_customers_n,
            config.fewest_orders_n,
        )
    }

    pub fn run(&self, warehouse: &Warehouse) -> AnalysisOutput {
        log::info!("🔄 Running analytics as of {}", self.as_of);
        let joined = warehouse.joined_sales();

        let (top_products, bottom_products) = self.product_rankings(&joined);
        let customer_segments =
            segment_customers(warehouse.customers(), warehouse.sales(), &self.thresholds);
        let product_segments =
            segment_products(warehouse.products(), warehouse.sales(), &self.thresholds);

        let output = AnalysisOutput {
            key_metrics: key_metrics(warehouse),
            date_range: date_range(warehouse, self.as_of),
            sales_by_year: sales_by_year(&joined),
            sales_by_month: sales_by_month(&joined),
            cumulative_monthly_sales: cumulative_monthly_sales(&joined),
            yearly_product_performance: yearly_product_performance(&joined),
            top_products,
            bottom_products,
            top_customers: self.top_customers(warehouse, &joined),
            fewest_orders_customers: self.fewest_orders_customers(warehouse, &joined),
            category_contribution: category_contribution(&joined),
            customer_segments: customer_segment_counts(&customer_segments),
            product_cost_bands: cost_band_counts(&product_segments),
            customer_report: build_customer_report(
                warehouse.customers(),
                warehouse.sales(),
                &self.thresholds,
                self.as_of,
            ),
            product_report: build_product_report(
                warehouse.products(),
                warehouse.sales(),
                &self.thresholds,
                self.as_of,
            ),
        };

        log::info!(
            "✅ Analytics complete: {} customers, {} products, {} sales",
            output.customer_report.len(),
            output.product_report.len(),
            warehouse.sales().len()
        );
        output
    }

    fn product_rankings(
        &self,
        joined: &[JoinedSale<'_>],
    ) -> (Vec<Ranked<ProductRevenue>>, Vec<Ranked<ProductRevenue>>) {
        let revenue: Vec<ProductRevenue> = aggregate(
            joined,
            &[GroupKey::ProductKey, GroupKey::ProductName],
            &[Measure::TotalSales],
        )
        .into_iter()
        .map(|row| ProductRevenue {
            product_key: key_int(&row, 0),
            product_name: key_text(&row, 1),
            total_sales: row.values[0],
        })
        .collect();

        let top = top_n(
            rank(revenue.clone(), |p| p.total_sales, RankDirection::Top),
            self.top_n,
        );
        let bottom = top_n(
            rank(revenue, |p| p.total_sales, RankDirection::Bottom),
            self.top_n,
        );
        (top, bottom)
    }

    fn top_customers(
        &self,
        warehouse: &Warehouse,
        joined: &[JoinedSale<'_>],
    ) -> Vec<Ranked<CustomerRevenue>> {
        let rows: Vec<CustomerRevenue> =
            aggregate(joined, &[GroupKey::CustomerKey], &[Measure::TotalSales])
                .into_iter()
                .map(|row| {
                    let customer_key = key_int(&row, 0);
                    let customer = warehouse.customer(customer_key);
                    CustomerRevenue {
                        customer_key,
                        first_name: customer.map(|c| c.first_name.clone()),
                        last_name: customer.map(|c| c.last_name.clone()),
                        total_sales: row.values[0],
                    }
                })
                .collect();

        top_n(
            rank(rows, |c| c.total_sales, RankDirection::Top),
            self.top_customers_n,
        )
    }

    fn fewest_orders_customers(
        &self,
        warehouse: &Warehouse,
        joined: &[JoinedSale<'_>],
    ) -> Vec<Ranked<CustomerOrders>> {
        let rows: Vec<CustomerOrders> =
            aggregate(joined, &[GroupKey::CustomerKey], &[Measure::DistinctOrders])
                .into_iter()
                .map(|row| {
                    let customer_key = key_int(&row, 0);
                    let customer = warehouse.customer(customer_key);
                    CustomerOrders {
                        customer_key,
                        first_name: customer.map(|c| c.first_name.clone()),
                        last_name: customer.map(|c| c.last_name.clone()),
                        total_orders: row.values[0] as usize,
                    }
                })
                .collect();

        top_n(
            rank(rows, |c| c.total_orders as f64, RankDirection::Bottom),
            self.fewest_orders_n,
        )
    }
}

fn key_int(row: &AggregateRow, idx: usize) -> i64 {
    row.keys.get(idx).and_then(KeyValue::as_int).unwrap_or_default()
}

fn key_text(row: &AggregateRow, idx: usize) -> Option<String> {
    row.keys
        .get(idx)
        .and_then(KeyValue::as_text)
        .map(str::to_string)
}

fn sales_by_year(joined: &[JoinedSale<'_>]) -> Vec<YearlySales> {
    aggregate(
        joined,
        &[GroupKey::OrderYear],
        &[Measure::TotalSales, Measure::DistinctCustomers, Measure::TotalQuantity],
    )
    .into_iter()
    .map(|row| YearlySales {
        order_year: key_int(&row, 0),
        total_sales: row.values[0],
        total_customers: row.values[1] as usize,
        total_quantity: row.values[2] as i64,
    })
    .collect()
}

fn sales_by_month(joined: &[JoinedSale<'_>]) -> Vec<MonthlySales> {
    aggregate(
        joined,
        &[GroupKey::OrderYear, GroupKey::OrderMonth],
        &[Measure::TotalSales, Measure::DistinctCustomers, Measure::TotalQuantity],
    )
    .into_iter()
    .map(|row| MonthlySales {
        order_year: key_int(&row, 0),
        order_month: key_int(&row, 1),
        total_sales: row.values[0],
        total_customers: row.values[1] as usize,
        total_quantity: row.values[2] as i64,
    })
    .collect()
}

#[derive(Debug, Clone)]
struct MonthPoint {
    order_year: i64,
    order_date: NaiveDate,
    total_sales: f64,
    avg_price: f64,
}

fn cumulative_monthly_sales(joined: &[JoinedSale<'_>]) -> Vec<CumulativeMonth> {
    let points: Vec<MonthPoint> = aggregate(
        joined,
        &[GroupKey::OrderMonthStart],
        &[Measure::TotalSales, Measure::AveragePrice],
    )
    .into_iter()
    .filter_map(|row| {
        let order_date = row.keys.first().and_then(KeyValue::as_date)?;
        Some(MonthPoint {
            order_year: i64::from(order_date.year()),
            order_date,
            total_sales: row.values[0],
            avg_price: row.values[1],
        })
    })
    .collect();

    // Both scans sort by (year, month) over unique months, so they line up
    let sales = running_total(points.clone(), |p| p.order_year, |p| p.order_date, |p| p.total_sales);
    let prices = running_total(points, |p| p.order_year, |p| p.order_date, |p| p.avg_price);

    sales
        .into_iter()
        .zip(prices)
        .map(|(s, p)| CumulativeMonth {
            order_year: s.row.order_year,
            order_date: s.row.order_date,
            total_sales: s.row.total_sales,
            running_total_sales: s.running_total,
            avg_price: p.row.avg_price,
            moving_average_price: p.moving_average,
        })
        .collect()
}

fn yearly_product_performance(joined: &[JoinedSale<'_>]) -> Vec<PeriodComparison<ProductYear>> {
    let rows: Vec<ProductYear> = aggregate(
        joined,
        &[GroupKey::OrderYear, GroupKey::ProductKey, GroupKey::ProductName],
        &[Measure::TotalSales],
    )
    .into_iter()
    .map(|row| ProductYear {
        order_year: key_int(&row, 0),
        product_key: key_int(&row, 1),
        product_name: key_text(&row, 2),
        total_sales: row.values[0],
    })
    .collect();

    period_over_period(
        rows,
        |r| (r.product_key, r.product_name.clone()),
        |r| r.order_year,
        |r| r.total_sales,
    )
}

/// Category shares of total sales, largest category first
fn category_contribution(joined: &[JoinedSale<'_>]) -> Vec<Contribution<CategorySales>> {
    let mut rows: Vec<CategorySales> = aggregate(joined, &[GroupKey::Category], &[Measure::TotalSales])
        .into_iter()
        .map(|row| CategorySales {
            category: key_text(&row, 0),
            total_sales: row.values[0],
        })
        .collect();
    rows.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));

    contribution(rows, |r| r.total_sales, |_| ())
}
