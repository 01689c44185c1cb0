//! Headline metrics and date ranges of the warehouse

use super::ratio::safe_div;
use crate::calendar::{months_between, years_between};
use crate::output::ReportRow;
use crate::warehouse::Warehouse;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub total_sales: f64,
    pub total_quantity: i64,
    pub avg_price: f64,
    pub total_orders: usize,
    pub total_products: usize,
    pub products_sold: usize,
    pub total_customers: usize,
    pub customers_ordered: usize,
}

impl ReportRow for KeyMetrics {
    fn columns() -> Vec<&'static str> {
        vec![
            "total_sales",
            "total_quantity",
            "avg_price",
            "total_orders",
            "total_products",
            "products_sold",
            "total_customers",
            "customers_ordered",
        ]
    }
}

pub fn key_metrics(warehouse: &Warehouse) -> KeyMetrics {
    let sales = warehouse.sales();

    let total_sales: f64 = sales.iter().map(|s| s.sales_amount).sum();
    let total_quantity: i64 = sales.iter().map(|s| s.quantity).sum();
    let price_sum: f64 = sales.iter().map(|s| s.price).sum();

    let orders: HashSet<&str> = sales.iter().map(|s| s.order_number.as_str()).collect();
    let products_sold: HashSet<i64> = sales.iter().map(|s| s.product_key).collect();
    let customers_ordered: HashSet<i64> = sales.iter().map(|s| s.customer_key).collect();

    KeyMetrics {
        total_sales,
        total_quantity,
        avg_price: safe_div(price_sum, sales.len() as f64),
        total_orders: orders.len(),
        total_products: warehouse.products().len(),
        products_sold: products_sold.len(),
        total_customers: warehouse.customers().len(),
        customers_ordered: customers_ordered.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub first_order_date: Option<NaiveDate>,
    pub last_order_date: Option<NaiveDate>,
    pub order_range_months: Option<i64>,
    pub oldest_birthdate: Option<NaiveDate>,
    pub oldest_age: Option<i64>,
    pub youngest_birthdate: Option<NaiveDate>,
    pub youngest_age: Option<i64>,
}

impl ReportRow for DateRange {
    fn columns() -> Vec<&'static str> {
        vec![
            "first_order_date",
            "last_order_date",
            "order_range_months",
            "oldest_birthdate",
            "oldest_age",
            "youngest_birthdate",
            "youngest_age",
        ]
    }
}

/// Order date boundaries and customer age extremes as of `as_of`
pub fn date_range(warehouse: &Warehouse, as_of: NaiveDate) -> DateRange {
    let order_dates = warehouse.sales().iter().filter_map(|s| s.order_date);
    let first_order_date = order_dates.clone().min();
    let last_order_date = order_dates.max();

    let birthdates = warehouse.customers().iter().filter_map(|c| c.birthdate);
    let oldest_birthdate = birthdates.clone().min();
    let youngest_birthdate = birthdates.max();

    DateRange {
        first_order_date,
        last_order_date,
        order_range_months: first_order_date
            .zip(last_order_date)
            .map(|(first, last)| months_between(first, last)),
        oldest_birthdate,
        oldest_age: oldest_birthdate.map(|b| years_between(b, as_of)),
        youngest_birthdate,
        youngest_age: youngest_birthdate.map(|b| years_between(b, as_of)),
    }
}
