//! Outlier check
//!
//! Values are normalized to z-scores, `(x - mean) / std` with the sample
//! standard deviation, and the bounds are applied to the z-scores (so bounds
//! are in standard deviations). Three variants:
//!
//! - **Whole series**: one mean/std per column.
//! - **Rolling**: mean/std over the trailing closed window, at least two
//!   observations.
//! - **Streaming**: the z-score of each point against its trailing history,
//!   with failed points removed from later history. See [`super::streaming`].
//!
//! A zero standard deviation gives an infinite z-score, which is treated as
//! missing and never fails.

use serde::{Deserialize, Serialize};

use super::streaming::{History, PointVerdict};
use super::window::{mean_std, rolling_mean_std, window_starts};
use super::{bound_masks, default_min_failures, Bounds, Flagged};
use crate::dataset::Dataset;
use crate::errors::{QcError, QcResult};
use crate::time::duration_from_secs;
use crate::translation::Selector;

/// Rebase fraction used by the streaming variant
pub const STREAMING_REBASE: f64 = 0.5;

/// Options for the outlier check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierCheck {
    /// Accepted z-score range
    pub bounds: Bounds,
    /// Window in seconds; `None` normalizes over the whole series
    #[serde(default)]
    pub window: Option<f64>,
    /// Columns to check
    #[serde(default)]
    pub selector: Selector,
    /// Compare absolute z-scores
    #[serde(default)]
    pub absolute_value: bool,
    /// Use the sequential streaming framework
    #[serde(default)]
    pub streaming: bool,
    /// Shortest failed run to report
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
}

impl OutlierCheck {
    /// Whole-series outlier check over all columns
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            window: None,
            selector: Selector::All,
            absolute_value: false,
            streaming: false,
            min_failures: 1,
        }
    }

    /// Normalize over a trailing window of `secs`
    pub fn window(mut self, secs: f64) -> Self {
        self.window = Some(secs);
        self
    }

    /// Restrict to a selector
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Compare absolute z-scores
    pub fn absolute_value(mut self, absolute: bool) -> Self {
        self.absolute_value = absolute;
        self
    }

    /// Use the streaming framework (requires a window)
    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
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
            "|Outlier|"
        } else {
            "Outlier"
        }
    }
}

fn finite_or_nan(z: f64) -> f64 {
    if z.is_infinite() {
        f64::NAN
    } else {
        z
    }
}

/// Z-scores of every column
pub fn zscores(data: &Dataset, window: Option<f64>) -> QcResult<Dataset> {
    let starts = match window {
        Some(secs) => {
            let w = duration_from_secs(secs)?;
            if !data.is_monotonic() {
                return Err(QcError::NonMonotonicIndex);
            }
            Some(window_starts(data.index(), w))
        }
        None => None,
    };

    let columns = data.columns().iter().map(|c| {
        let z: Vec<f64> = match &starts {
            Some(starts) => {
                let (means, stds) = rolling_mean_std(&c.values, starts);
                c.values
                    .iter()
                    .zip(means.iter().zip(&stds))
                    .map(|(x, (m, s))| finite_or_nan((x - m) / s))
                    .collect()
            }
            None => {
                let (m, s) = mean_std(&c.values);
                c.values.iter().map(|x| finite_or_nan((x - m) / s)).collect()
            }
        };
        (c.name.clone(), z)
    });
    Dataset::from_columns(data.index().to_vec(), columns)
}

/// Batch outlier masks, lower bound first
pub fn outlier_masks(data: &Dataset, opts: &OutlierCheck) -> QcResult<Vec<Flagged>> {
    opts.bounds.validate()?;
    let mut z = zscores(data, opts.window)?;
    if opts.absolute_value {
        let abs: Vec<(String, Vec<f64>)> = z
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.values.iter().map(|v| v.abs()).collect()))
            .collect();
        z = Dataset::from_columns(z.index().to_vec(), abs)?;
    }
    Ok(bound_masks(&z, &opts.bounds, opts.prefix()))
}

/// Point classifier scoring each point against its history
///
/// Metadata is the z-score. A z-score that cannot be computed passes.
pub fn streaming_classifier(bounds: Bounds, absolute: bool) -> impl FnMut(&[f64], &History<'_>) -> PointVerdict {
    move |point: &[f64], history: &History<'_>| {
        let mut verdict = PointVerdict {
            pass: Vec::with_capacity(point.len()),
            metadata: Vec::with_capacity(point.len()),
        };
        for (col, &x) in point.iter().enumerate() {
            let (mean, std) = mean_std(history.column(col));
            let mut z = finite_or_nan((x - mean) / std);
            if absolute {
                z = z.abs();
            }
            verdict.pass.push(bounds.passes(z));
            verdict.metadata.push(z);
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::streaming::run_streaming;
    use crate::time::Timestamp;
    use chrono::{Duration, NaiveDate};

    fn index(n: usize) -> Vec<Timestamp> {
        let t0 = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        (0..n).map(|i| t0 + Duration::hours(i as i64)).collect()
    }

    #[test]
    fn whole_series_zscore() {
        let data = Dataset::from_columns(index(4), vec![("A", vec![1.0, 2.0, 3.0, 4.0])]).unwrap();
        let z = zscores(&data, None).unwrap();
        let a = z.column("A").unwrap();
        // mean 2.5, sample std sqrt(5/3)
        let s = (5.0f64 / 3.0).sqrt();
        assert!((a[0] + 1.5 / s).abs() < 1e-12);
        assert!((a[3] - 1.5 / s).abs() < 1e-12);
    }

    #[test]
    fn constant_series_is_missing_not_failure() {
        let data = Dataset::from_columns(index(3), vec![("A", vec![2.0, 2.0, 2.0])]).unwrap();
        let z = zscores(&data, Some(7200.0)).unwrap();
        assert!(z.column("A").unwrap().iter().all(|v| v.is_nan()));

        let masks = outlier_masks(&data, &OutlierCheck::new(Bounds::between(-1.0, 1.0))).unwrap();
        assert!(masks.iter().all(|f| f.mask.all_pass()));
    }

    #[test]
    fn absolute_labels() {
        let data = Dataset::from_columns(index(4), vec![("A", vec![1.0, 2.0, 3.0, 40.0])]).unwrap();
        let masks = outlier_masks(&data, &OutlierCheck::new(Bounds::upper(1.0)).absolute_value(true)).unwrap();
        assert_eq!(masks[0].label, "|Outlier| > upper bound, 1");
        assert_eq!(masks[0].mask.column(0), &[true, true, true, false]);
    }

    #[test]
    fn streaming_removes_spike_from_history() {
        let values = vec![10.0, 10.5, 9.5, 10.0, 100.0, 10.2, 9.8];
        let data = Dataset::from_columns(index(7), vec![("A", values)]).unwrap();
        let mut classifier = streaming_classifier(Bounds::between(-3.0, 3.0), false);
        let out = run_streaming(&data, &mut classifier, 4.0 * 3600.0, Some(STREAMING_REBASE)).unwrap();
        assert_eq!(out.mask.column(0), &[true, true, true, true, false, true, true]);
        assert!(out.metadata.column("A").unwrap()[0] > 3.0);
    }
}
