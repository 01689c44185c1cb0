//! Part-to-whole analysis

use super::ratio::safe_div;
use crate::output::ReportRow;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution<T> {
    #[serde(flatten)]
    pub row: T,
    pub measure: f64,
    pub partition_total: f64,
    /// `100 * measure / partition_total`; 0 when the total is 0
    pub percent_of_total: f64,
}

impl<T: ReportRow> ReportRow for Contribution<T> {
    fn columns() -> Vec<&'static str> {
        let mut columns = T::columns();
        columns.extend(["measure", "partition_total", "percent_of_total"]);
        columns
    }
}

/// Share of each row's measure in the total of its partition
///
/// Output keeps input order.
pub fn contribution<T, P, FM, FP>(rows: Vec<T>, measure: FM, partition: FP) -> Vec<Contribution<T>>
where
    P: Ord,
    FM: Fn(&T) -> f64,
    FP: Fn(&T) -> P,
{
    let mut totals: BTreeMap<P, f64> = BTreeMap::new();
    for row in &rows {
        *totals.entry(partition(row)).or_insert(0.0) += measure(row);
    }

    rows.into_iter()
        .map(|row| {
            let value = measure(&row);
            let partition_total = totals.get(&partition(&row)).copied().unwrap_or(0.0);
            Contribution {
                row,
                measure: value,
                partition_total,
                percent_of_total: safe_div(100.0 * value, partition_total),
            }
        })
        .collect()
}
