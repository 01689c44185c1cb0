//! Ranking and window functions
//!
//! Every order-dependent operation sorts its input first (stable sort by
//! partition, then time) and scans the sorted sequence. Nothing relies on the
//! order rows arrive in.

use super::ratio::{checked_ratio, serialize_or_na};
use crate::output::ReportRow;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirection {
    /// Highest measure first
    Top,
    /// Lowest measure first
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub rank: usize,
    #[serde(flatten)]
    pub row: T,
}

impl<T: ReportRow> ReportRow for Ranked<T> {
    fn columns() -> Vec<&'static str> {
        let mut columns = vec!["rank"];
        columns.extend(T::columns());
        columns
    }
}

/// Competitive ranking: ties share a rank and the next rank skips (1, 2, 2, 4)
///
/// Tied rows keep their input order.
pub fn rank<T, F>(rows: Vec<T>, measure: F, direction: RankDirection) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> f64,
{
    let mut keyed: Vec<(f64, T)> = rows.into_iter().map(|row| (measure(&row), row)).collect();
    keyed.sort_by(|a, b| match direction {
        RankDirection::Top => b.0.total_cmp(&a.0),
        RankDirection::Bottom => a.0.total_cmp(&b.0),
    });

    let mut ranked = Vec::with_capacity(keyed.len());
    let mut previous: Option<f64> = None;
    let mut current_rank = 0;

    for (position, (value, row)) in keyed.into_iter().enumerate() {
        if previous != Some(value) {
            current_rank = position + 1;
            previous = Some(value);
        }
        ranked.push(Ranked {
            rank: current_rank,
            row,
        });
    }

    ranked
}

/// Keep rows with `rank <= n`; ties at the cut-off are all kept
pub fn top_n<T>(ranked: Vec<Ranked<T>>, n: usize) -> Vec<Ranked<T>> {
    ranked.into_iter().filter(|r| r.rank <= n).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningRow<T> {
    #[serde(flatten)]
    pub row: T,
    pub running_total: f64,
    pub moving_average: f64,
}

/// Cumulative sum and running mean of `measure` within each partition, in time order
pub fn running_total<T, P, K, FP, FK, FM>(
    rows: Vec<T>,
    partition: FP,
    time: FK,
    measure: FM,
) -> Vec<RunningRow<T>>
where
    P: Ord,
    K: Ord,
    FP: Fn(&T) -> P,
    FK: Fn(&T) -> K,
    FM: Fn(&T) -> f64,
{
    let rows = sort_partitioned(rows, &partition, &time);

    let mut out = Vec::with_capacity(rows.len());
    let mut current: Option<P> = None;
    let mut sum = 0.0;
    let mut count = 0usize;

    for row in rows {
        let p = partition(&row);
        if current.as_ref() != Some(&p) {
            sum = 0.0;
            count = 0;
            current = Some(p);
        }

        sum += measure(&row);
        count += 1;

        out.push(RunningRow {
            row,
            running_total: sum,
            moving_average: sum / count as f64,
        });
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Increase,
    Decrease,
    #[serde(rename = "No Change")]
    NoChange,
    #[serde(rename = "n/a")]
    NotApplicable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increase => "Increase",
            Trend::Decrease => "Decrease",
            Trend::NoChange => "No Change",
            Trend::NotApplicable => "n/a",
        }
    }

    fn from_delta(delta: Option<f64>) -> Self {
        match delta {
            None => Trend::NotApplicable,
            Some(d) if d > 0.0 => Trend::Increase,
            Some(d) if d < 0.0 => Trend::Decrease,
            Some(_) => Trend::NoChange,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AverageComparison {
    #[serde(rename = "Above Avg")]
    AboveAverage,
    #[serde(rename = "Below Avg")]
    BelowAverage,
    #[serde(rename = "Avg")]
    Average,
}

impl AverageComparison {
    fn from_diff(diff: f64) -> Self {
        if diff > 0.0 {
            AverageComparison::AboveAverage
        } else if diff < 0.0 {
            AverageComparison::BelowAverage
        } else {
            AverageComparison::Average
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison<T> {
    #[serde(flatten)]
    pub row: T,
    pub current: f64,
    #[serde(serialize_with = "serialize_or_na")]
    pub previous: Option<f64>,
    #[serde(serialize_with = "serialize_or_na")]
    pub delta: Option<f64>,
    /// Percent change against the previous period; `n/a` when previous is absent or 0
    #[serde(serialize_with = "serialize_or_na")]
    pub pct_change: Option<f64>,
    pub trend: Trend,
    pub partition_average: f64,
    pub diff_from_average: f64,
    pub vs_average: AverageComparison,
}

impl<T: ReportRow> ReportRow for PeriodComparison<T> {
    fn columns() -> Vec<&'static str> {
        let mut columns = T::columns();
        columns.extend([
            "current",
            "previous",
            "delta",
            "pct_change",
            "trend",
            "partition_average",
            "diff_from_average",
            "vs_average",
        ]);
        columns
    }
}

/// Compare each row with the previous row of its partition in time order
pub fn period_over_period<T, P, K, FP, FK, FM>(
    rows: Vec<T>,
    partition: FP,
    time: FK,
    measure: FM,
) -> Vec<PeriodComparison<T>>
where
    P: Ord,
    K: Ord,
    FP: Fn(&T) -> P,
    FK: Fn(&T) -> K,
    FM: Fn(&T) -> f64,
{
    let rows = sort_partitioned(rows, &partition, &time);
    let total = rows.len();

    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut current: Option<P> = None;
    for row in rows {
        let p = partition(&row);
        if current.as_ref() != Some(&p) {
            groups.push(Vec::new());
            current = Some(p);
        }
        if let Some(group) = groups.last_mut() {
            group.push(row);
        }
    }

    let mut out = Vec::with_capacity(total);
    for group in groups {
        let values: Vec<f64> = group.iter().map(&measure).collect();
        let average = values.iter().sum::<f64>() / values.len() as f64;

        let mut previous: Option<f64> = None;
        for (row, value) in group.into_iter().zip(values) {
            let delta = previous.map(|p| value - p);
            let pct_change = match (delta, previous) {
                (Some(d), Some(p)) => checked_ratio(d, p).map(|r| r * 100.0),
                _ => None,
            };
            let diff_from_average = value - average;

            out.push(PeriodComparison {
                row,
                current: value,
                previous,
                delta,
                pct_change,
                trend: Trend::from_delta(delta),
                partition_average: average,
                diff_from_average,
                vs_average: AverageComparison::from_diff(diff_from_average),
            });

            previous = Some(value);
        }
    }

    out
}

fn sort_partitioned<T, P, K, FP, FK>(mut rows: Vec<T>, partition: &FP, time: &FK) -> Vec<T>
where
    P: Ord,
    K: Ord,
    FP: Fn(&T) -> P,
    FK: Fn(&T) -> K,
{
    rows.sort_by(|a, b| {
        partition(a)
            .cmp(&partition(b))
            .then_with(|| time(a).cmp(&time(b)))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Point {
        partition: &'static str,
        period: i32,
        value: f64,
    }

    fn point(partition: &'static str, period: i32, value: f64) -> Point {
        Point {
            partition,
            period,
            value,
        }
    }

    #[test]
    fn test_competitive_rank_with_ties() {
        let ranked = rank(vec![100.0, 90.0, 100.0, 80.0], |v| *v, RankDirection::Top);

        let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
        let values: Vec<f64> = ranked.iter().map(|r| r.row).collect();
        assert_eq!(ranks, vec![1, 1, 3, 4]);
        assert_eq!(values, vec![100.0, 100.0, 90.0, 80.0]);
    }

    #[test]
    fn test_bottom_rank_ascending() {
        let ranked = rank(vec![5.0, 1.0, 3.0], |v| *v, RankDirection::Bottom);
        let values: Vec<f64> = ranked.iter().map(|r| r.row).collect();
        assert_eq!(values, vec![1.0, 3.0, 5.0]);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn test_top_n_keeps_ties_at_cutoff() {
        let values = vec![100.0, 90.0, 80.0, 70.0, 60.0, 60.0, 60.0, 50.0, 40.0, 30.0];
        let ranked = rank(values, |v| *v, RankDirection::Top);

        let top = top_n(ranked, 5);

        assert_eq!(top.len(), 7);
        assert!(top.iter().all(|r| r.rank <= 5));
        assert_eq!(top.last().unwrap().rank, 5);
    }

    #[test]
    fn test_running_total_single_partition() {
        let rows = vec![point("a", 3, 30.0), point("a", 1, 10.0), point("a", 2, 20.0)];

        let out = running_total(rows, |p| p.partition, |p| p.period, |p| p.value);

        let totals: Vec<f64> = out.iter().map(|r| r.running_total).collect();
        let averages: Vec<f64> = out.iter().map(|r| r.moving_average).collect();
        assert_eq!(totals, vec![10.0, 30.0, 60.0]);
        assert_eq!(averages, vec![10.0, 15.0, 20.0]);
    }

    #[test]
    fn test_running_total_resets_per_partition() {
        let rows = vec![
            point("2013", 1, 5.0),
            point("2012", 1, 10.0),
            point("2012", 2, 20.0),
            point("2013", 2, 7.0),
        ];

        let out = running_total(rows, |p| p.partition, |p| p.period, |p| p.value);

        let totals: Vec<f64> = out.iter().map(|r| r.running_total).collect();
        assert_eq!(totals, vec![10.0, 30.0, 5.0, 12.0]);
    }

    #[test]
    fn test_period_over_period() {
        let rows = vec![
            point("bike", 2013, 150.0),
            point("bike", 2012, 100.0),
            point("bike", 2014, 150.0),
            point("helmet", 2012, 0.0),
            point("helmet", 2013, 30.0),
        ];

        let out = period_over_period(rows, |p| p.partition, |p| p.period, |p| p.value);

        assert_eq!(out[0].row.period, 2012);
        assert_eq!(out[0].previous, None);
        assert_eq!(out[0].delta, None);
        assert_eq!(out[0].trend, Trend::NotApplicable);

        assert_eq!(out[1].previous, Some(100.0));
        assert_eq!(out[1].delta, Some(50.0));
        assert_eq!(out[1].pct_change, Some(50.0));
        assert_eq!(out[1].trend, Trend::Increase);

        assert_eq!(out[2].trend, Trend::NoChange);
        assert!((out[2].partition_average - 400.0 / 3.0).abs() < 1e-9);
        assert_eq!(out[2].vs_average, AverageComparison::AboveAverage);
        assert_eq!(out[0].vs_average, AverageComparison::BelowAverage);

        // Previous value of 0: delta defined, percent change is n/a
        assert_eq!(out[4].row.partition, "helmet");
        assert_eq!(out[4].delta, Some(30.0));
        assert_eq!(out[4].pct_change, None);
    }

    #[test]
    fn test_period_comparison_serializes_na() {
        let out = period_over_period(vec![point("a", 1, 1.0)], |p| p.partition, |p| p.period, |p| p.value);
        let json = serde_json::to_value(&out[0]).unwrap();

        assert_eq!(json["previous"], "n/a");
        assert_eq!(json["pct_change"], "n/a");
        assert_eq!(json["trend"], "n/a");
        assert_eq!(json["vs_average"], "Avg");
        assert_eq!(json["period"], 1);
    }
}
