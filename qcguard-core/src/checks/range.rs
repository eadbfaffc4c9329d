//! Range and increment checks
//!
//! Range compares each value to the bounds directly. Increment first
//! differences each column against the value `increment` rows earlier
//! (optionally taking the absolute value) and applies the same bounds to the
//! differences. The first `increment` rows have no predecessor and are
//! treated as missing, so they always pass.

use serde::{Deserialize, Serialize};

use super::{bound_masks, default_min_failures, default_true, Bounds, Flagged};
use crate::dataset::{is_missing, Dataset, MISSING};
use crate::errors::{QcError, QcResult};
use crate::translation::Selector;

/// Options for the range check
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeCheck {
    /// Accepted value range
    pub bounds: Bounds,
    /// Columns to check
    #[serde(default)]
    pub selector: Selector,
    /// Shortest failed run to report
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
}

impl RangeCheck {
    /// Range check over all columns
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds, selector: Selector::All, min_failures: 1 }
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

/// Options for the increment check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementCheck {
    /// Accepted increment range
    pub bounds: Bounds,
    /// Columns to check
    #[serde(default)]
    pub selector: Selector,
    /// Row shift used for the difference
    #[serde(default = "default_increment")]
    pub increment: usize,
    /// Compare absolute differences
    #[serde(default = "default_true")]
    pub absolute_value: bool,
    /// Shortest failed run to report
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
}

fn default_increment() -> usize {
    1
}

impl IncrementCheck {
    /// Absolute single-step increment check over all columns
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            selector: Selector::All,
            increment: 1,
            absolute_value: true,
            min_failures: 1,
        }
    }

    /// Restrict to a selector
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Row shift for the difference
    pub fn increment(mut self, rows: usize) -> Self {
        self.increment = rows;
        self
    }

    /// Use signed differences when `false`
    pub fn absolute_value(mut self, absolute: bool) -> Self {
        self.absolute_value = absolute;
        self
    }

    /// Set the shortest reported run
    pub fn min_failures(mut self, n: usize) -> Self {
        self.min_failures = n;
        self
    }

    /// Label prefix
    pub fn prefix(&self) -> &'static str {
        if self.absolute_value {
            "|Increment|"
        } else {
            "Increment"
        }
    }
}

/// Range masks for `data`
pub fn range_masks(data: &Dataset, bounds: &Bounds) -> QcResult<Vec<Flagged>> {
    bounds.validate()?;
    Ok(bound_masks(data, bounds, "Data"))
}

/// Differences against the value `increment` rows earlier
pub fn difference(data: &Dataset, increment: usize, absolute: bool) -> QcResult<Dataset> {
    let columns = data.columns().iter().map(|c| {
        let values = (0..c.values.len())
            .map(|i| {
                if i < increment {
                    return MISSING;
                }
                let d = c.values[i] - c.values[i - increment];
                if absolute { d.abs() } else { d }
            })
            .collect();
        (c.name.clone(), values)
    });
    Dataset::from_columns(data.index().to_vec(), columns)
}

/// Increment masks for `data`
///
/// Fails with [`QcError::AllNull`] when every selected value is missing.
pub fn increment_masks(data: &Dataset, opts: &IncrementCheck) -> QcResult<Vec<Flagged>> {
    opts.bounds.validate()?;
    if opts.increment == 0 {
        return Err(QcError::InvalidIncrement { increment: 0 });
    }
    if data.columns().iter().all(|c| c.values.iter().all(|&v| is_missing(v))) {
        return Err(QcError::AllNull);
    }
    let diffs = difference(data, opts.increment, opts.absolute_value)?;
    Ok(bound_masks(&diffs, &opts.bounds, opts.prefix()))
}
