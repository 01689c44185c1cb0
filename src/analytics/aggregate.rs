//! Grouped aggregation over the joined fact table

use crate::calendar::{month_start, months_between};
use crate::warehouse::{JoinedSale, SalesTransaction};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    OrderYear,
    OrderMonth,
    OrderMonthStart,
    Category,
    Subcategory,
    ProductKey,
    ProductName,
    CustomerKey,
    Country,
    Gender,
    MaritalStatus,
}

impl GroupKey {
    pub fn column_name(&self) -> &'static str {
        match self {
            GroupKey::OrderYear => "order_year",
            GroupKey::OrderMonth => "order_month",
            GroupKey::OrderMonthStart => "order_date",
            GroupKey::Category => "category",
            GroupKey::Subcategory => "subcategory",
            GroupKey::ProductKey => "product_key",
            GroupKey::ProductName => "product_name",
            GroupKey::CustomerKey => "customer_key",
            GroupKey::Country => "country",
            GroupKey::Gender => "gender",
            GroupKey::MaritalStatus => "marital_status",
        }
    }

    /// Date-part keys drop rows without an order date
    pub fn is_date_part(&self) -> bool {
        matches!(
            self,
            GroupKey::OrderYear | GroupKey::OrderMonth | GroupKey::OrderMonthStart
        )
    }

    fn extract(&self, row: &JoinedSale<'_>) -> KeyValue {
        let sale = row.sale;
        match self {
            GroupKey::OrderYear => sale
                .order_date
                .map(|d| KeyValue::Int(i64::from(d.year())))
                .unwrap_or(KeyValue::Null),
            GroupKey::OrderMonth => sale
                .order_date
                .map(|d| KeyValue::Int(i64::from(d.month())))
                .unwrap_or(KeyValue::Null),
            GroupKey::OrderMonthStart => sale
                .order_date
                .map(|d| KeyValue::Date(month_start(d)))
                .unwrap_or(KeyValue::Null),
            GroupKey::Category => text(row.product.map(|p| p.category.as_str())),
            GroupKey::Subcategory => text(row.product.map(|p| p.subcategory.as_str())),
            GroupKey::ProductKey => KeyValue::Int(sale.product_key),
            GroupKey::ProductName => text(row.product.map(|p| p.product_name.as_str())),
            GroupKey::CustomerKey => KeyValue::Int(sale.customer_key),
            GroupKey::Country => text(row.customer.map(|c| c.country.as_str())),
            GroupKey::Gender => text(row.customer.map(|c| c.gender.as_str())),
            GroupKey::MaritalStatus => text(row.customer.map(|c| c.marital_status.as_str())),
        }
    }
}

fn text(value: Option<&str>) -> KeyValue {
    value
        .map(|s| KeyValue::Text(s.to_string()))
        .unwrap_or(KeyValue::Null)
}

/// A grouping key value; `Null` sorts first
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Null,
    Int(i64),
    Date(NaiveDate),
    Text(String),
}

impl KeyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            KeyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            KeyValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    TotalSales,
    TotalQuantity,
    AveragePrice,
    RowCount,
    DistinctOrders,
    DistinctCustomers,
    DistinctProducts,
}

impl Measure {
    pub fn column_name(&self) -> &'static str {
        match self {
            Measure::TotalSales => "total_sales",
            Measure::TotalQuantity => "total_quantity",
            Measure::AveragePrice => "avg_price",
            Measure::RowCount => "row_count",
            Measure::DistinctOrders => "total_orders",
            Measure::DistinctCustomers => "total_customers",
            Measure::DistinctProducts => "total_products",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub keys: Vec<KeyValue>,
    pub values: Vec<f64>,
}

impl AggregateRow {
    /// Flatten into a JSON object using the key and measure column names
    pub fn to_json(&self, keys: &[GroupKey], measures: &[Measure]) -> Value {
        let mut object = Map::new();
        for (key, value) in keys.iter().zip(&self.keys) {
            object.insert(
                key.column_name().to_string(),
                serde_json::to_value(value).unwrap_or(Value::Null),
            );
        }
        for (measure, value) in measures.iter().zip(&self.values) {
            object.insert(measure.column_name().to_string(), Value::from(*value));
        }
        Value::Object(object)
    }
}

#[derive(Default)]
struct Accumulator<'a> {
    total_sales: f64,
    total_quantity: i64,
    price_sum: f64,
    rows: usize,
    orders: HashSet<&'a str>,
    customers: HashSet<i64>,
    products: HashSet<i64>,
}

impl<'a> Accumulator<'a> {
    fn add(&mut self, sale: &'a SalesTransaction) {
        self.total_sales += sale.sales_amount;
        self.total_quantity += sale.quantity;
        self.price_sum += sale.price;
        self.rows += 1;
        self.orders.insert(sale.order_number.as_str());
        self.customers.insert(sale.customer_key);
        self.products.insert(sale.product_key);
    }

    fn value(&self, measure: Measure) -> f64 {
        match measure {
            Measure::TotalSales => self.total_sales,
            Measure::TotalQuantity => self.total_quantity as f64,
            Measure::AveragePrice => {
                if self.rows == 0 {
                    0.0
                } else {
                    self.price_sum / self.rows as f64
                }
            }
            Measure::RowCount => self.rows as f64,
            Measure::DistinctOrders => self.orders.len() as f64,
            Measure::DistinctCustomers => self.customers.len() as f64,
            Measure::DistinctProducts => self.products.len() as f64,
        }
    }
}

/// One row per distinct key combination, ordered by key
///
/// Rows without an order date are skipped when any key is a date part.
pub fn aggregate(
    sales: &[JoinedSale<'_>],
    keys: &[GroupKey],
    measures: &[Measure],
) -> Vec<AggregateRow> {
    let needs_date = keys.iter().any(GroupKey::is_date_part);
    let mut groups: BTreeMap<Vec<KeyValue>, Accumulator<'_>> = BTreeMap::new();

    for row in sales {
        if needs_date && row.sale.order_date.is_none() {
            continue;
        }
        let group_key: Vec<KeyValue> = keys.iter().map(|k| k.extract(row)).collect();
        groups.entry(group_key).or_default().add(row.sale);
    }

    groups
        .into_iter()
        .map(|(keys, acc)| AggregateRow {
            keys,
            values: measures.iter().map(|m| acc.value(*m)).collect(),
        })
        .collect()
}

/// Per-entity purchase activity (one customer, or one product)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activity {
    pub total_sales: f64,
    pub total_quantity: i64,
    pub total_orders: usize,
    /// Distinct products for a customer, distinct customers for a product
    pub distinct_counterparts: usize,
    pub first_order: Option<NaiveDate>,
    pub last_order: Option<NaiveDate>,
    unit_price_sum: f64,
    unit_price_count: usize,
}

impl Activity {
    /// Calendar months between first and last dated order; `None` without dated orders
    pub fn lifespan_months(&self) -> Option<i64> {
        match (self.first_order, self.last_order) {
            (Some(first), Some(last)) => Some(months_between(first, last)),
            _ => None,
        }
    }

    /// Mean of `sales_amount / quantity` over lines with non-zero quantity
    pub fn average_unit_price(&self) -> f64 {
        if self.unit_price_count == 0 {
            0.0
        } else {
            self.unit_price_sum / self.unit_price_count as f64
        }
    }
}

#[derive(Default)]
struct ActivityBuilder<'a> {
    activity: Activity,
    orders: HashSet<&'a str>,
    counterparts: HashSet<i64>,
}

/// Build activity summaries keyed by `key`, counting distinct `counterpart` values
pub fn activity_by<K, C>(sales: &[SalesTransaction], key: K, counterpart: C) -> HashMap<i64, Activity>
where
    K: Fn(&SalesTransaction) -> i64,
    C: Fn(&SalesTransaction) -> i64,
{
    let mut builders: HashMap<i64, ActivityBuilder<'_>> = HashMap::new();

    for sale in sales {
        let builder = builders.entry(key(sale)).or_default();
        let activity = &mut builder.activity;

        activity.total_sales += sale.sales_amount;
        activity.total_quantity += sale.quantity;
        if sale.quantity != 0 {
            activity.unit_price_sum += sale.sales_amount / sale.quantity as f64;
            activity.unit_price_count += 1;
        }
        if let Some(date) = sale.order_date {
            activity.first_order = Some(activity.first_order.map_or(date, |d| d.min(date)));
            activity.last_order = Some(activity.last_order.map_or(date, |d| d.max(date)));
        }

        builder.orders.insert(sale.order_number.as_str());
        builder.counterparts.insert(counterpart(sale));
    }

    builders
        .into_iter()
        .map(|(k, builder)| {
            let mut activity = builder.activity;
            activity.total_orders = builder.orders.len();
            activity.distinct_counterparts = builder.counterparts.len();
            (k, activity)
        })
        .collect()
}

pub fn customer_activity(sales: &[SalesTransaction]) -> HashMap<i64, Activity> {
    activity_by(sales, |s| s.customer_key, |s| s.product_key)
}

pub fn product_activity(sales: &[SalesTransaction]) -> HashMap<i64, Activity> {
    activity_by(sales, |s| s.product_key, |s| s.customer_key)
}
