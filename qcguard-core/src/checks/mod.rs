//! QC Test Battery
//!
//! ## Overview
//!
//! Each check is a pure kernel that reads a [`Dataset`] (already narrowed to
//! the selected columns) and returns one or more labelled pass/fail masks.
//! The engine owns everything stateful around the kernels: selector
//! resolution, the time filter, interval extraction, and appending results.
//!
//! ```text
//!              ┌──────────┐   Flagged { label, mask }   ┌───────────┐
//! Dataset ───> │  kernel  │ ──────────────────────────> │  engine   │ ──> intervals
//!              └──────────┘   one per bound / sub-check  └───────────┘
//! ```
//!
//! ## Checks
//!
//! | Check      | Kernel                        | Labels                                  |
//! |------------|-------------------------------|-----------------------------------------|
//! | timestamp  | [`timestamp::timestamp_masks`]| Nonmonotonic / Duplicate / Missing timestamp |
//! | range      | [`range::range_masks`]        | `Data < lower bound, x`                 |
//! | increment  | [`range::increment_masks`]    | `\|Increment\| > upper bound, x`         |
//! | delta      | [`delta::delta_masks`]        | `Delta (+) > upper bound, x`            |
//! | outlier    | [`outlier::outlier_masks`]    | `Outlier < lower bound, x`              |
//! | missing    | [`missing::missing_mask`]     | `Missing data`                          |
//! | corrupt    | [`missing::corrupt_mask`]     | `Corrupt data`                          |
//! | custom     | [`custom`], [`streaming`]     | caller supplied                         |
//!
//! ## Bounds
//!
//! All value checks share the same bound logic: a cell fails when it lies
//! strictly below the lower bound or strictly above the upper bound. Missing
//! cells never fail a bound comparison.

pub mod custom;
pub mod delta;
pub mod missing;
pub mod outlier;
pub mod range;
pub mod streaming;
pub mod timestamp;
mod window;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::errors::{QcError, QcResult};
use crate::mask::Mask;

pub use custom::{CustomStaticCheck, StaticClassifier, StaticOutput};
pub use delta::{DeltaCheck, Direction};
pub use missing::{CorruptCheck, MissingCheck};
pub use outlier::OutlierCheck;
pub use range::{IncrementCheck, RangeCheck};
pub use streaming::{CustomStreamingCheck, History, PointClassifier, PointVerdict, StreamingOutcome};
pub use timestamp::TimestampCheck;

/// A labelled pass/fail mask produced by a check kernel
#[derive(Debug, Clone, PartialEq)]
pub struct Flagged {
    /// Error label attached to every interval extracted from `mask`
    pub label: String,
    /// Pass/fail grid
    pub mask: Mask,
}

/// Lower and upper bound, either of which may be disabled
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Values strictly below fail
    #[serde(default)]
    pub lower: Option<f64>,
    /// Values strictly above fail
    #[serde(default)]
    pub upper: Option<f64>,
}

impl Bounds {
    /// Both bounds
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    /// Lower bound only
    pub fn lower(lower: f64) -> Self {
        Self { lower: Some(lower), upper: None }
    }

    /// Upper bound only
    pub fn upper(upper: f64) -> Self {
        Self { lower: None, upper: Some(upper) }
    }

    /// Both bounds set
    pub fn between(lower: f64, upper: f64) -> Self {
        Self { lower: Some(lower), upper: Some(upper) }
    }

    /// Reject NaN or infinite bounds
    pub fn validate(&self) -> QcResult<()> {
        for value in [self.lower, self.upper].into_iter().flatten() {
            if !value.is_finite() {
                return Err(QcError::InvalidBound { value });
            }
        }
        Ok(())
    }

    /// `"<prefix> < lower bound, <value>"`
    pub fn lower_label(prefix: &str, value: f64) -> String {
        format!("{} < lower bound, {}", prefix, value)
    }

    /// `"<prefix> > upper bound, <value>"`
    pub fn upper_label(prefix: &str, value: f64) -> String {
        format!("{} > upper bound, {}", prefix, value)
    }

    /// True when `value` passes both bounds (missing values pass)
    #[inline]
    pub fn passes(&self, value: f64) -> bool {
        !self.below(value) && !self.above(value)
    }

    #[inline]
    pub(crate) fn below(&self, value: f64) -> bool {
        self.lower.map_or(false, |lb| value < lb)
    }

    #[inline]
    pub(crate) fn above(&self, value: f64) -> bool {
        self.upper.map_or(false, |ub| value > ub)
    }
}

/// Default `min_failures` for every check
pub(crate) fn default_min_failures() -> usize {
    1
}

pub(crate) fn default_true() -> bool {
    true
}

/// Lower-bound mask then upper-bound mask over a grid of values
///
/// Disabled bounds produce no mask.
pub(crate) fn bound_masks(values: &Dataset, bounds: &Bounds, prefix: &str) -> Vec<Flagged> {
    let mut out = Vec::with_capacity(2);
    if let Some(lb) = bounds.lower {
        out.push(Flagged {
            label: Bounds::lower_label(prefix, lb),
            mask: map_mask(values, |v| !(v < lb)),
        });
    }
    if let Some(ub) = bounds.upper {
        out.push(Flagged {
            label: Bounds::upper_label(prefix, ub),
            mask: map_mask(values, |v| !(v > ub)),
        });
    }
    out
}

/// Mask with `pass(value)` evaluated for every cell
pub(crate) fn map_mask(values: &Dataset, pass: impl Fn(f64) -> bool) -> Mask {
    let mut mask = Mask::filled(values.index(), &values.column_names(), true);
    for (col, column) in values.columns().iter().enumerate() {
        for (cell, &v) in mask.column_mut(col).iter_mut().zip(&column.values) {
            *cell = pass(v);
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn labels_follow_display() {
        assert_eq!(Bounds::lower_label("Data", 0.0001), "Data < lower bound, 0.0001");
        assert_eq!(Bounds::upper_label("|Outlier|", 1.9), "|Outlier| > upper bound, 1.9");
        assert_eq!(Bounds::upper_label("Delta (+)", 7.0), "Delta (+) > upper bound, 7");
    }

    #[test]
    fn nan_bound_rejected() {
        assert!(Bounds::new(Some(f64::NAN), None).validate().is_err());
        assert!(Bounds::between(-1.0, 1.0).validate().is_ok());
        assert!(Bounds::default().validate().is_ok());
    }

    #[test]
    fn missing_values_pass() {
        let b = Bounds::between(0.0, 1.0);
        assert!(b.passes(f64::NAN));
        assert!(b.passes(1.0));
        assert!(!b.passes(1.5));
        assert!(!b.passes(-0.1));
    }

    #[test]
    fn bound_masks_order() {
        let t = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let data = Dataset::from_columns(vec![t], vec![("A", vec![5.0])]).unwrap();
        let masks = bound_masks(&data, &Bounds::between(0.0, 1.0), "Data");
        assert_eq!(masks.len(), 2);
        assert!(masks[0].mask.all_pass());
        assert!(!masks[1].mask.all_pass());
        assert!(bound_masks(&data, &Bounds::default(), "Data").is_empty());
    }
}
