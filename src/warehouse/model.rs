//! Star-schema records: two dimension tables and one fact table

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_key: i64,
    #[serde(default)]
    pub customer_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub marital_status: String,
    #[serde(default)]
    pub country: String,
}

impl Customer {
    /// First and last name joined by a single space, ignoring empty parts
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_key: i64,
    #[serde(default)]
    pub product_number: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub product_line: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub maintenance: bool,
}

/// One row per sales order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesTransaction {
    pub order_number: String,
    pub product_key: i64,
    pub customer_key: i64,
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    #[serde(default)]
    pub shipping_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub sales_amount: f64,
    pub quantity: i64,
    pub price: f64,
}

/// Accepts `Yes`/`No`, `true`/`false`, `1`/`0` (case-insensitive). Empty is `false`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(false);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid maintenance flag: {}",
            other
        ))),
    }
}
