//! Guarded division
//!
//! Ratios never raise or produce NaN/inf: totals use `safe_div` (0 on a zero
//! denominator), comparisons use `checked_ratio` and render `n/a`.

use serde::Serializer;

pub const NOT_APPLICABLE: &str = "n/a";

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `numerator / denominator`, or `None` when the denominator is 0
pub fn checked_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Serde helper: absent values serialize as the string `n/a`
pub fn serialize_or_na<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_str(NOT_APPLICABLE),
    }
}
