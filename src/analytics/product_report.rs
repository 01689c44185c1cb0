//! Product report: one row per product with sales KPIs, cost band and revenue tier

use super::aggregate::product_activity;
use super::ratio::safe_div;
use super::segment::{cost_band_rules, performance_rules, CostBand, PerformanceTier, SegmentThresholds};
use crate::calendar::months_between;
use crate::output::ReportRow;
use crate::warehouse::{Product, SalesTransaction};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductReportRow {
    pub product_key: i64,
    pub product_number: String,
    pub product_name: String,
    pub category: String,
    pub subcategory: String,
    pub cost: f64,
    pub cost_range: CostBand,
    pub product_segment: PerformanceTier,
    pub last_sale_date: Option<NaiveDate>,
    pub recency_months: Option<i64>,
    pub lifespan_months: Option<i64>,
    pub total_orders: usize,
    pub total_sales: f64,
    pub total_quantity: i64,
    pub total_customers: usize,
    pub avg_selling_price: f64,
    pub avg_order_revenue: f64,
    pub avg_monthly_revenue: f64,
}

impl ReportRow for ProductReportRow {
    fn columns() -> Vec<&'static str> {
        vec![
            "product_key",
            "product_number",
            "product_name",
            "category",
            "subcategory",
            "cost",
            "cost_range",
            "product_segment",
            "last_sale_date",
            "recency_months",
            "lifespan_months",
            "total_orders",
            "total_sales",
            "total_quantity",
            "total_customers",
            "avg_selling_price",
            "avg_order_revenue",
            "avg_monthly_revenue",
        ]
    }
}

pub fn build_product_report(
    products: &[Product],
    sales: &[SalesTransaction],
    thresholds: &SegmentThresholds,
    as_of: NaiveDate,
) -> Vec<ProductReportRow> {
    let activity = product_activity(sales);
    let cost_rules = cost_band_rules(thresholds);
    let tier_rules = performance_rules(thresholds);

    let report: Vec<ProductReportRow> = products
        .iter()
        .map(|product| {
            let activity = activity.get(&product.product_key);
            let cost = product.cost.unwrap_or(0.0);

            let total_orders = activity.map_or(0, |a| a.total_orders);
            let total_sales = activity.map_or(0.0, |a| a.total_sales);
            let last_sale_date = activity.and_then(|a| a.last_order);
            let lifespan_months = activity.and_then(|a| a.lifespan_months());

            ProductReportRow {
                product_key: product.product_key,
                product_number: product.product_number.clone(),
                product_name: product.product_name.clone(),
                category: product.category.clone(),
                subcategory: product.subcategory.clone(),
                cost,
                cost_range: cost_rules.classify(&cost),
                product_segment: tier_rules.classify(&total_sales),
                last_sale_date,
                recency_months: last_sale_date.map(|d| months_between(d, as_of)),
                lifespan_months,
                total_orders,
                total_sales,
                total_quantity: activity.map_or(0, |a| a.total_quantity),
                total_customers: activity.map_or(0, |a| a.distinct_counterparts),
                avg_selling_price: activity.map_or(0.0, |a| a.average_unit_price()),
                avg_order_revenue: safe_div(total_sales, total_orders as f64),
                avg_monthly_revenue: lifespan_months
                    .map_or(0.0, |months| safe_div(total_sales, months as f64)),
            }
        })
        .collect();

    log::debug!("Built product report with {} rows", report.len());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::fixtures::*;

    #[test]
    fn test_product_kpis() {
        let products = vec![product(10, "Mountain-200", "Bikes", 1250.0)];
        let sales = vec![
            sale("SO1", 1, 10, Some(date(2012, 3, 1)), 20_000.0, 10),
            sale("SO2", 2, 10, Some(date(2013, 3, 1)), 30_000.0, 10),
            sale("SO3", 2, 10, Some(date(2013, 9, 1)), 4_000.0, 0),
        ];

        let report = build_product_report(&products, &sales, &SegmentThresholds::default(), date(2014, 1, 1));

        let row = &report[0];
        assert_eq!(row.total_orders, 3);
        assert_eq!(row.total_sales, 54_000.0);
        assert_eq!(row.total_quantity, 20);
        assert_eq!(row.total_customers, 2);
        assert_eq!(row.lifespan_months, Some(18));
        assert_eq!(row.recency_months, Some(4));
        assert_eq!(row.cost_range, CostBand::Above1000);
        assert_eq!(row.product_segment, PerformanceTier::HighPerformer);
        // Zero-quantity line excluded from the unit price mean
        assert_eq!(row.avg_selling_price, 2_500.0);
        assert_eq!(row.avg_order_revenue, 18_000.0);
        assert_eq!(row.avg_monthly_revenue, 3_000.0);
    }

    #[test]
    fn test_unsold_product() {
        let products = vec![product(11, "Touring Tire", "Accessories", 10.0)];

        let report = build_product_report(&products, &[], &SegmentThresholds::default(), date(2014, 1, 1));

        let row = &report[0];
        assert_eq!(row.total_orders, 0);
        assert_eq!(row.avg_selling_price, 0.0);
        assert_eq!(row.avg_order_revenue, 0.0);
        assert_eq!(row.avg_monthly_revenue, 0.0);
        assert_eq!(row.lifespan_months, None);
        assert_eq!(row.product_segment, PerformanceTier::LowPerformer);
        assert_eq!(row.cost_range, CostBand::Below100);
    }
}
