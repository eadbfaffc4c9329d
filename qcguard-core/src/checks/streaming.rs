//! Streaming custom checks
//!
//! ## Overview
//!
//! A sequential, single-pass framework. Starting at the first timestamp one
//! window past the start of the data, each row is classified by a
//! caller-supplied [`PointClassifier`] that sees only the current point and
//! the trailing history before it. Nothing after `t` is ever visible.
//!
//! ```text
//!             history (t - window .. t)      point
//!           ┌──────────────────────────────┐ ┌───┐
//! working:  │ 1.0  1.1  NaN  0.9  1.0  1.2 │ │ x │  ->  classify(x, history)
//!           └──────────────────────────────┘ └───┘
//!                      ^ failed earlier, removed from history
//! ```
//!
//! ## Design
//!
//! The framework keeps a working copy of the data. A point that fails is
//! written back as missing so it cannot pollute later history. After a long
//! anomaly the history could become mostly missing and stay that way, so an
//! optional `rebase` fraction restores the original value of the current
//! point for any column whose trailing window (history plus point) is more
//! than that fraction missing. Rebasing changes the working history only;
//! the failure stays recorded in the mask.
//!
//! History starts at the row whose timestamp is nearest to `t - window`
//! (ties go to the later row) and excludes the current row.

use serde::{Deserialize, Serialize};

use super::default_min_failures;
use super::window::mean_std;
use crate::dataset::{is_missing, Dataset};
use crate::errors::{QcError, QcResult};
use crate::mask::Mask;
use crate::time::{duration_from_secs, Timestamp};
use crate::translation::Selector;

/// Trailing history handed to a [`PointClassifier`]
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    names: &'a [String],
    columns: &'a [Vec<f64>],
    start: usize,
    end: usize,
}

impl<'a> History<'a> {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when there is no history
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Column names, in point order
    pub fn names(&self) -> &'a [String] {
        self.names
    }

    /// History of column `col`, oldest first
    pub fn column(&self, col: usize) -> &'a [f64] {
        &self.columns[col][self.start..self.end]
    }

    /// Mean of the non-missing history of `col`
    pub fn mean(&self, col: usize) -> f64 {
        mean_std(self.column(col)).0
    }

    /// Sample standard deviation of the non-missing history of `col`
    pub fn std(&self, col: usize) -> f64 {
        mean_std(self.column(col)).1
    }
}

/// Verdict for one point
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointVerdict {
    /// Pass flag per column
    pub pass: Vec<bool>,
    /// Caller-defined value per column, returned as metadata
    pub metadata: Vec<f64>,
}

/// Classifies one point against its trailing history
pub trait PointClassifier {
    /// `point[i]` belongs to `history.column(i)`
    fn classify(&mut self, point: &[f64], history: &History<'_>) -> PointVerdict;
}

impl<F> PointClassifier for F
where
    F: FnMut(&[f64], &History<'_>) -> PointVerdict,
{
    fn classify(&mut self, point: &[f64], history: &History<'_>) -> PointVerdict {
        self(point, history)
    }
}

/// Options for a streaming custom check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomStreamingCheck {
    /// History window in seconds
    pub window: f64,
    /// Columns to check
    #[serde(default)]
    pub selector: Selector,
    /// Missing fraction above which history is rebased
    #[serde(default)]
    pub rebase: Option<f64>,
    /// Shortest failed run to report
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
    /// Label for reported intervals
    #[serde(default = "default_message")]
    pub error_message: String,
}

fn default_message() -> String {
    "Custom".to_string()
}

impl CustomStreamingCheck {
    /// Streaming check over all columns
    pub fn new(window: f64) -> Self {
        Self {
            window,
            selector: Selector::All,
            rebase: None,
            min_failures: 1,
            error_message: default_message(),
        }
    }

    /// Restrict to a selector
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Enable rebasing above this missing fraction
    pub fn rebase(mut self, fraction: f64) -> Self {
        self.rebase = Some(fraction);
        self
    }

    /// Set the shortest reported run
    pub fn min_failures(mut self, n: usize) -> Self {
        self.min_failures = n;
        self
    }

    /// Label for reported intervals
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }
}

/// Result of a streaming pass
#[derive(Debug, Clone)]
pub struct StreamingOutcome {
    /// Pass/fail grid over the whole input
    pub mask: Mask,
    /// Classifier metadata, one row per evaluated timestamp
    pub metadata: Dataset,
    /// Number of cells restored by rebasing
    pub rebase_count: usize,
}

/// Run `classifier` over `data` in timestamp order
pub fn run_streaming<C>(
    data: &Dataset,
    classifier: &mut C,
    window_secs: f64,
    rebase: Option<f64>,
) -> QcResult<StreamingOutcome>
where
    C: PointClassifier + ?Sized,
{
    let window = duration_from_secs(window_secs)?;
    if let Some(r) = rebase {
        if !(0.0..=1.0).contains(&r) {
            return Err(QcError::InvalidFraction { value: r });
        }
    }
    if !data.is_monotonic() {
        return Err(QcError::NonMonotonicIndex);
    }

    let index = data.index();
    let names = data.column_names();
    let width = names.len();
    let mut mask = Mask::filled(index, &names, true);
    let mut working: Vec<Vec<f64>> = data.columns().iter().map(|c| c.values.clone()).collect();
    let mut meta_index: Vec<Timestamp> = Vec::new();
    let mut meta_columns: Vec<Vec<f64>> = vec![Vec::new(); width];
    let mut rebase_count = 0;

    let first = match index.first() {
        Some(&t0) => index.partition_point(|&t| t < t0 + window),
        None => 0,
    };

    for t in first..index.len() {
        let t_start = nearest_row(index, index[t] - window);
        let point: Vec<f64> = working.iter().map(|c| c[t]).collect();
        let verdict = {
            let history = History { names: &names, columns: &working, start: t_start, end: t };
            classifier.classify(&point, &history)
        };
        for len in [verdict.pass.len(), verdict.metadata.len()] {
            if len != width {
                return Err(QcError::ClassifierShape { expected: width, actual: len });
            }
        }

        for (col, &pass) in verdict.pass.iter().enumerate() {
            mask.set(t, col, pass);
            if !pass {
                working[col][t] = f64::NAN;
            }
        }
        meta_index.push(index[t]);
        for (dst, v) in meta_columns.iter_mut().zip(&verdict.metadata) {
            dst.push(*v);
        }

        if let Some(threshold) = rebase {
            let rows = (t + 1 - t_start) as f64;
            for (col, column) in working.iter_mut().enumerate() {
                let missing = column[t_start..=t].iter().filter(|v| is_missing(**v)).count();
                if missing as f64 / rows > threshold {
                    column[t] = data.columns()[col].values[t];
                    rebase_count += 1;
                }
            }
        }
    }

    let metadata = Dataset::from_columns(meta_index, names.into_iter().zip(meta_columns))?;
    Ok(StreamingOutcome { mask, metadata, rebase_count })
}

// Row whose timestamp is nearest `target`; ties go to the later row.
fn nearest_row(index: &[Timestamp], target: Timestamp) -> usize {
    let p = index.partition_point(|&t| t < target);
    if p == 0 {
        return 0;
    }
    if p == index.len() {
        return p - 1;
    }
    if index[p] - target <= target - index[p - 1] {
        p
    } else {
        p - 1
    }
}
