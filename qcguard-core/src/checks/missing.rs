//! Missing and corrupt data checks

use serde::{Deserialize, Serialize};

use super::{default_min_failures, map_mask};
use crate::dataset::{is_missing, Dataset};
use crate::mask::Mask;
use crate::translation::Selector;

/// Options for the missing data check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingCheck {
    /// Columns to check
    #[serde(default)]
    pub selector: Selector,
    /// Shortest failed run to report
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
}

impl Default for MissingCheck {
    fn default() -> Self {
        Self { selector: Selector::All, min_failures: 1 }
    }
}

impl MissingCheck {
    /// Missing check over all columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a selector
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Set the shortest reported run
    pub fn min_failures(mut self, n: usize) -> Self {
        self.min_failures = n;
        self
    }
}

/// Options for the corrupt data check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorruptCheck {
    /// Sentinel values a sensor emits on failure
    pub corrupt_values: Vec<f64>,
    /// Columns to check
    #[serde(default)]
    pub selector: Selector,
    /// Shortest failed run to report
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
}

impl CorruptCheck {
    /// Corrupt check over all columns
    pub fn new(corrupt_values: Vec<f64>) -> Self {
        Self { corrupt_values, selector: Selector::All, min_failures: 1 }
    }

    /// Restrict to a selector
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Set the shortest reported run
    pub fn min_failures(mut self, n: usize) -> Self {
        self.min_failures = n;
        self
    }
}

/// Pass where a value is present
pub fn missing_mask(data: &Dataset) -> Mask {
    map_mask(data, |v| !is_missing(v))
}

/// Pass where a value is not one of `corrupt_values`
///
/// A NaN entry in `corrupt_values` matches NaN cells.
pub fn corrupt_mask(data: &Dataset, corrupt_values: &[f64]) -> Mask {
    map_mask(data, |v| !corrupt_values.iter().any(|&c| c == v || (c.is_nan() && v.is_nan())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn data() -> Dataset {
        let t0 = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let index = (0..4).map(|i| t0 + chrono::Duration::minutes(15 * i)).collect();
        Dataset::from_columns(index, vec![("A", vec![1.0, f64::NAN, -999.0, f64::INFINITY])]).unwrap()
    }

    #[test]
    fn missing_includes_infinite() {
        assert_eq!(missing_mask(&data()).column(0), &[true, false, true, false]);
    }

    #[test]
    fn corrupt_matches_sentinels() {
        assert_eq!(corrupt_mask(&data(), &[-999.0]).column(0), &[true, true, false, true]);
        assert_eq!(corrupt_mask(&data(), &[f64::NAN]).column(0), &[true, false, true, true]);
    }
}
