//! In-memory star schema
//!
//! ```text
//! dim_customers ─┐
//!                ├─ LEFT JOIN ─ fact_sales → JoinedSale
//! dim_products ──┘
//! ```
//!
//! Tables are immutable once built. Unmatched fact keys keep their row and
//! carry `None` for the missing dimension.

pub mod loader;
pub mod model;

pub use loader::{load_warehouse, read_csv_file, read_records, LoadError, LoadStats, TableLoad};
pub use model::{Customer, Product, SalesTransaction};

use std::collections::HashMap;

/// A fact row joined to both dimensions
#[derive(Debug, Clone, Copy)]
pub struct JoinedSale<'a> {
    pub sale: &'a SalesTransaction,
    pub customer: Option<&'a Customer>,
    pub product: Option<&'a Product>,
}

#[derive(Debug, Clone, Default)]
pub struct Warehouse {
    customers: Vec<Customer>,
    products: Vec<Product>,
    sales: Vec<SalesTransaction>,
    customer_index: HashMap<i64, usize>,
    product_index: HashMap<i64, usize>,
}

impl Warehouse {
    /// Build the warehouse, dropping dimension rows whose key was already seen
    pub fn new(
        customers: Vec<Customer>,
        products: Vec<Product>,
        sales: Vec<SalesTransaction>,
    ) -> Self {
        let (customers, customer_index) = dedupe_by_key(customers, |c| c.customer_key, "customer");
        let (products, product_index) = dedupe_by_key(products, |p| p.product_key, "product");

        let warehouse = Self {
            customers,
            products,
            sales,
            customer_index,
            product_index,
        };

        let missing_customers = warehouse.missing_customer_refs();
        let missing_products = warehouse.missing_product_refs();
        if missing_customers > 0 || missing_products > 0 {
            log::warn!(
                "⚠️  {} sales reference unknown customers, {} reference unknown products (kept with empty attributes)",
                missing_customers,
                missing_products
            );
        }

        warehouse
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn sales(&self) -> &[SalesTransaction] {
        &self.sales
    }

    pub fn customer(&self, customer_key: i64) -> Option<&Customer> {
        self.customer_index
            .get(&customer_key)
            .map(|&idx| &self.customers[idx])
    }

    pub fn product(&self, product_key: i64) -> Option<&Product> {
        self.product_index
            .get(&product_key)
            .map(|&idx| &self.products[idx])
    }

    /// Left join every fact row to its customer and product
    pub fn joined_sales(&self) -> Vec<JoinedSale<'_>> {
        self.sales
            .iter()
            .map(|sale| JoinedSale {
                sale,
                customer: self.customer(sale.customer_key),
                product: self.product(sale.product_key),
            })
            .collect()
    }

    /// Number of fact rows whose customer_key has no dimension row
    pub fn missing_customer_refs(&self) -> usize {
        self.sales
            .iter()
            .filter(|s| !self.customer_index.contains_key(&s.customer_key))
            .count()
    }

    /// Number of fact rows whose product_key has no dimension row
    pub fn missing_product_refs(&self) -> usize {
        self.sales
            .iter()
            .filter(|s| !self.product_index.contains_key(&s.product_key))
            .count()
    }
}

fn dedupe_by_key<T>(
    rows: Vec<T>,
    key: impl Fn(&T) -> i64,
    table: &str,
) -> (Vec<T>, HashMap<i64, usize>) {
    let mut index = HashMap::with_capacity(rows.len());
    let mut kept = Vec::with_capacity(rows.len());
    let mut duplicates = 0;

    for row in rows {
        let k = key(&row);
        if index.contains_key(&k) {
            duplicates += 1;
            continue;
        }
        index.insert(k, kept.len());
        kept.push(row);
    }

    if duplicates > 0 {
        log::warn!("Dropped {} duplicate {} rows (first occurrence kept)", duplicates, table);
    }

    (kept, index)
}
