//! Customer report: one row per customer with purchase KPIs
//!
//! Age and recency are measured against an explicit `as_of` date so the
//! report is reproducible.

use super::aggregate::customer_activity;
use super::ratio::safe_div;
use super::segment::{
    age_group_rules, customer_rules, AgeGroup, CustomerSegment, CustomerSpend, SegmentThresholds,
};
use crate::calendar::{months_between, years_between};
use crate::output::ReportRow;
use crate::warehouse::{Customer, SalesTransaction};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerReportRow {
    pub customer_key: i64,
    pub customer_number: String,
    pub customer_name: String,
    pub age: Option<i64>,
    pub age_group: AgeGroup,
    pub customer_segment: CustomerSegment,
    pub last_order_date: Option<NaiveDate>,
    pub recency_months: Option<i64>,
    pub total_orders: usize,
    pub total_sales: f64,
    pub total_quantity: i64,
    pub total_products: usize,
    pub lifespan_months: Option<i64>,
    pub avg_order_value: f64,
    pub avg_monthly_spend: f64,
}

impl ReportRow for CustomerReportRow {
    fn columns() -> Vec<&'static str> {
        vec![
            "customer_key",
            "customer_number",
            "customer_name",
            "age",
            "age_group",
            "customer_segment",
            "last_order_date",
            "recency_months",
            "total_orders",
            "total_sales",
            "total_quantity",
            "total_products",
            "lifespan_months",
            "avg_order_value",
            "avg_monthly_spend",
        ]
    }
}

pub fn build_customer_report(
    customers: &[Customer],
    sales: &[SalesTransaction],
    thresholds: &SegmentThresholds,
    as_of: NaiveDate,
) -> Vec<CustomerReportRow> {
    let activity = customer_activity(sales);
    let segments = customer_rules(thresholds);
    let age_groups = age_group_rules();

    let report: Vec<CustomerReportRow> = customers
        .iter()
        .map(|customer| {
            let activity = activity.get(&customer.customer_key);
            let spend = CustomerSpend::from(activity);
            let age = customer.birthdate.map(|b| years_between(b, as_of));

            let total_orders = activity.map_or(0, |a| a.total_orders);
            let total_sales = spend.total_spending;
            let last_order_date = activity.and_then(|a| a.last_order);
            let lifespan_months = spend.lifespan_months;

            CustomerReportRow {
                customer_key: customer.customer_key,
                customer_number: customer.customer_number.clone(),
                customer_name: customer.full_name(),
                age,
                age_group: age_groups.classify(&age),
                customer_segment: segments.classify(&spend),
                last_order_date,
                recency_months: last_order_date.map(|d| months_between(d, as_of)),
                total_orders,
                total_sales,
                total_quantity: activity.map_or(0, |a| a.total_quantity),
                total_products: activity.map_or(0, |a| a.distinct_counterparts),
                lifespan_months,
                avg_order_value: safe_div(total_sales, total_orders as f64),
                avg_monthly_spend: lifespan_months
                    .map_or(0.0, |months| safe_div(total_sales, months as f64)),
            }
        })
        .collect();

    log::debug!("Built customer report with {} rows", report.len());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::fixtures::*;

    #[test]
    fn test_customer_without_orders() {
        let customers = vec![customer(7, "Idle", Some(date(1990, 5, 1)))];

        let report = build_customer_report(&customers, &[], &SegmentThresholds::default(), date(2025, 3, 1));

        let row = &report[0];
        assert_eq!(row.total_orders, 0);
        assert_eq!(row.total_sales, 0.0);
        assert_eq!(row.avg_order_value, 0.0);
        assert_eq!(row.avg_monthly_spend, 0.0);
        assert_eq!(row.lifespan_months, None);
        assert_eq!(row.recency_months, None);
        assert_eq!(row.customer_segment, CustomerSegment::New);
        assert_eq!(row.age, Some(35));
        assert_eq!(row.age_group, AgeGroup::From30To39);
    }

    #[test]
    fn test_customer_kpis() {
        let customers = vec![customer(1, "Ann", None)];
        let sales = vec![
            sale("SO1", 1, 10, Some(date(2012, 1, 15)), 2000.0, 1),
            sale("SO1", 1, 20, Some(date(2012, 1, 15)), 1000.0, 2),
            sale("SO2", 1, 10, Some(date(2013, 2, 3)), 3000.0, 1),
            sale("SO3", 1, 10, None, 600.0, 1),
        ];

        let report = build_customer_report(&customers, &sales, &SegmentThresholds::default(), date(2014, 2, 1));

        let row = &report[0];
        assert_eq!(row.customer_name, "Ann Test");
        assert_eq!(row.total_orders, 3);
        assert_eq!(row.total_sales, 6600.0);
        assert_eq!(row.total_quantity, 5);
        assert_eq!(row.total_products, 2);
        assert_eq!(row.last_order_date, Some(date(2013, 2, 3)));
        assert_eq!(row.lifespan_months, Some(13));
        assert_eq!(row.recency_months, Some(12));
        assert_eq!(row.customer_segment, CustomerSegment::Vip);
        assert_eq!(row.avg_order_value, 2200.0);
        assert!((row.avg_monthly_spend - 6600.0 / 13.0).abs() < 1e-9);
        assert_eq!(row.age_group, AgeGroup::Unknown);
    }

    #[test]
    fn test_zero_lifespan_monthly_spend_is_zero() {
        let customers = vec![customer(1, "Once", None)];
        let sales = vec![sale("SO1", 1, 10, Some(date(2013, 5, 1)), 250.0, 1)];

        let report = build_customer_report(&customers, &sales, &SegmentThresholds::default(), date(2013, 6, 1));

        assert_eq!(report[0].lifespan_months, Some(0));
        assert_eq!(report[0].avg_monthly_spend, 0.0);
        assert_eq!(report[0].avg_order_value, 250.0);
    }
}
