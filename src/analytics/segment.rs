//! Rule-based segmentation
//!
//! A `RuleSet` is an ordered list of (label, predicate) pairs evaluated top
//! down, with a fallback label when nothing matches. Priority is the list
//! order, and every input maps to exactly one label.

use super::aggregate::{customer_activity, product_activity, Activity};
use crate::output::ReportRow;
use crate::warehouse::{Customer, Product, SalesTransaction};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

type Predicate<I> = Box<dyn Fn(&I) -> bool + Send + Sync>;

pub struct RuleSet<I, L> {
    rules: Vec<(L, Predicate<I>)>,
    fallback: L,
}

impl<I, L: Clone> RuleSet<I, L> {
    pub fn new(fallback: L) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Append a rule; earlier rules win
    pub fn rule<F>(mut self, label: L, predicate: F) -> Self
    where
        F: Fn(&I) -> bool + Send + Sync + 'static,
    {
        self.rules.push((label, Box::new(predicate)));
        self
    }

    pub fn classify(&self, input: &I) -> L {
        self.rules
            .iter()
            .find(|(_, predicate)| predicate(input))
            .map(|(label, _)| label.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Thresholds for customer segments, product cost bands and revenue tiers
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentThresholds {
    pub vip_spending: f64,
    pub min_lifespan_months: i64,
    pub cost_low: f64,
    pub cost_mid: f64,
    pub cost_high: f64,
    pub high_performer_sales: f64,
    pub mid_range_sales: f64,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self {
            vip_spending: 5000.0,
            min_lifespan_months: 12,
            cost_low: 100.0,
            cost_mid: 500.0,
            cost_high: 1000.0,
            high_performer_sales: 50_000.0,
            mid_range_sales: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CustomerSegment {
    #[serde(rename = "VIP")]
    Vip,
    Regular,
    New,
}

impl CustomerSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerSegment::Vip => "VIP",
            CustomerSegment::Regular => "Regular",
            CustomerSegment::New => "New",
        }
    }
}

impl fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to customer segmentation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerSpend {
    pub total_spending: f64,
    pub lifespan_months: Option<i64>,
}

impl From<Option<&Activity>> for CustomerSpend {
    fn from(activity: Option<&Activity>) -> Self {
        match activity {
            Some(a) => CustomerSpend {
                total_spending: a.total_sales,
                lifespan_months: a.lifespan_months(),
            },
            None => CustomerSpend {
                total_spending: 0.0,
                lifespan_months: None,
            },
        }
    }
}

pub fn customer_rules(thresholds: &SegmentThresholds) -> RuleSet<CustomerSpend, CustomerSegment> {
    let min_lifespan = thresholds.min_lifespan_months;
    let vip_spending = thresholds.vip_spending;
    let established = move |s: &CustomerSpend| s.lifespan_months.is_some_and(|l| l >= min_lifespan);

    RuleSet::new(CustomerSegment::New)
        .rule(CustomerSegment::Vip, move |s: &CustomerSpend| {
            established(s) && s.total_spending > vip_spending
        })
        .rule(CustomerSegment::Regular, move |s: &CustomerSpend| {
            established(s) && s.total_spending <= vip_spending
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSegmentRow {
    pub customer_key: i64,
    pub total_spending: f64,
    pub lifespan_months: Option<i64>,
    pub segment: CustomerSegment,
}

/// Segment every customer; customers without sales are `New`
pub fn segment_customers(
    customers: &[Customer],
    sales: &[SalesTransaction],
    thresholds: &SegmentThresholds,
) -> Vec<CustomerSegmentRow> {
    let activity = customer_activity(sales);
    let rules = customer_rules(thresholds);

    customers
        .iter()
        .map(|customer| {
            let spend = CustomerSpend::from(activity.get(&customer.customer_key));
            CustomerSegmentRow {
                customer_key: customer.customer_key,
                total_spending: spend.total_spending,
                lifespan_months: spend.lifespan_months,
                segment: rules.classify(&spend),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentCount {
    pub segment: String,
    pub total: usize,
}

impl ReportRow for SegmentCount {
    fn columns() -> Vec<&'static str> {
        vec!["segment", "total"]
    }
}

/// Count customers per segment, largest segment first
pub fn customer_segment_counts(rows: &[CustomerSegmentRow]) -> Vec<SegmentCount> {
    count_labels(rows.iter().map(|r| r.segment.as_str()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CostBand {
    #[serde(rename = "Below 100")]
    Below100,
    #[serde(rename = "100-500")]
    From100To500,
    #[serde(rename = "500-1000")]
    From500To1000,
    #[serde(rename = "Above 1000")]
    Above1000,
}

impl CostBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostBand::Below100 => "Below 100",
            CostBand::From100To500 => "100-500",
            CostBand::From500To1000 => "500-1000",
            CostBand::Above1000 => "Above 1000",
        }
    }
}

impl fmt::Display for CostBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `cost < low`, `low..=mid`, `(mid)..=high`, above
pub fn cost_band_rules(thresholds: &SegmentThresholds) -> RuleSet<f64, CostBand> {
    let (low, mid, high) = (thresholds.cost_low, thresholds.cost_mid, thresholds.cost_high);

    RuleSet::new(CostBand::Above1000)
        .rule(CostBand::Below100, move |cost: &f64| *cost < low)
        .rule(CostBand::From100To500, move |cost: &f64| *cost <= mid)
        .rule(CostBand::From500To1000, move |cost: &f64| *cost <= high)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PerformanceTier {
    #[serde(rename = "High-Performer")]
    HighPerformer,
    #[serde(rename = "Mid-Range")]
    MidRange,
    #[serde(rename = "Low-Performer")]
    LowPerformer,
}

impl PerformanceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::HighPerformer => "High-Performer",
            PerformanceTier::MidRange => "Mid-Range",
            PerformanceTier::LowPerformer => "Low-Performer",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn performance_rules(thresholds: &SegmentThresholds) -> RuleSet<f64, PerformanceTier> {
    let (high, mid) = (thresholds.high_performer_sales, thresholds.mid_range_sales);

    RuleSet::new(PerformanceTier::LowPerformer)
        .rule(PerformanceTier::HighPerformer, move |sales: &f64| *sales > high)
        .rule(PerformanceTier::MidRange, move |sales: &f64| *sales >= mid)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSegmentRow {
    pub product_key: i64,
    pub product_name: String,
    pub cost: f64,
    pub cost_range: CostBand,
    pub total_sales: f64,
    pub performance: PerformanceTier,
}

/// Cost band and revenue tier for every product; missing cost counts as 0
pub fn segment_products(
    products: &[Product],
    sales: &[SalesTransaction],
    thresholds: &SegmentThresholds,
) -> Vec<ProductSegmentRow> {
    let activity = product_activity(sales);
    let cost_rules = cost_band_rules(thresholds);
    let tier_rules = performance_rules(thresholds);

    products
        .iter()
        .map(|product| {
            let cost = product.cost.unwrap_or(0.0);
            let total_sales = activity
                .get(&product.product_key)
                .map_or(0.0, |a| a.total_sales);
            ProductSegmentRow {
                product_key: product.product_key,
                product_name: product.product_name.clone(),
                cost,
                cost_range: cost_rules.classify(&cost),
                total_sales,
                performance: tier_rules.classify(&total_sales),
            }
        })
        .collect()
}

/// Count products per cost band, largest band first
pub fn cost_band_counts(rows: &[ProductSegmentRow]) -> Vec<SegmentCount> {
    count_labels(rows.iter().map(|r| r.cost_range.as_str()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgeGroup {
    #[serde(rename = "Under 20")]
    Under20,
    #[serde(rename = "20-29")]
    From20To29,
    #[serde(rename = "30-39")]
    From30To39,
    #[serde(rename = "40-49")]
    From40To49,
    #[serde(rename = "50 and above")]
    From50,
    Unknown,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Under20 => "Under 20",
            AgeGroup::From20To29 => "20-29",
            AgeGroup::From30To39 => "30-39",
            AgeGroup::From40To49 => "40-49",
            AgeGroup::From50 => "50 and above",
            AgeGroup::Unknown => "Unknown",
        }
    }
}

pub fn age_group_rules() -> RuleSet<Option<i64>, AgeGroup> {
    RuleSet::new(AgeGroup::Unknown)
        .rule(AgeGroup::Under20, |age: &Option<i64>| age.is_some_and(|a| a < 20))
        .rule(AgeGroup::From20To29, |age: &Option<i64>| age.is_some_and(|a| a <= 29))
        .rule(AgeGroup::From30To39, |age: &Option<i64>| age.is_some_and(|a| a <= 39))
        .rule(AgeGroup::From40To49, |age: &Option<i64>| age.is_some_and(|a| a <= 49))
        .rule(AgeGroup::From50, |age: &Option<i64>| age.is_some())
}

fn count_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<SegmentCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut out: Vec<SegmentCount> = counts
        .into_iter()
        .map(|(segment, total)| SegmentCount {
            segment: segment.to_string(),
            total,
        })
        .collect();
    // Stable: equal totals stay in label order
    out.sort_by(|a, b| b.total.cmp(&a.total));
    out
}
