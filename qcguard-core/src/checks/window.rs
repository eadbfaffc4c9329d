//! Trailing time-window statistics
//!
//! Windows are closed on both ends: the window ending at row `i` holds every
//! row `j` with `t[i] - w <= t[j] <= t[i]`. On a sorted index that is the
//! contiguous range `start[i]..=i`, and `start` never decreases, so the
//! bounds come from one two-pointer pass.
//!
//! A statistic needs at least [`MIN_PERIODS`] non-missing values in its
//! window; otherwise it is NaN.

use std::collections::VecDeque;

use chrono::Duration;

use crate::dataset::is_missing;
use crate::time::Timestamp;

pub(crate) const MIN_PERIODS: usize = 2;

/// First row of the trailing window ending at each row
pub(crate) fn window_starts(index: &[Timestamp], window: Duration) -> Vec<usize> {
    let mut starts = Vec::with_capacity(index.len());
    let mut lo = 0;
    for &t in index {
        let from = t - window;
        while index[lo] < from {
            lo += 1;
        }
        starts.push(lo);
    }
    starts
}

/// Rolling min and max over precomputed window bounds
///
/// Monotonic deques keep each pass linear.
pub(crate) fn rolling_min_max(values: &[f64], starts: &[usize]) -> (Vec<f64>, Vec<f64>) {
    let n = values.len();
    let mut mins = vec![f64::NAN; n];
    let mut maxs = vec![f64::NAN; n];
    let mut min_q: VecDeque<usize> = VecDeque::new();
    let mut max_q: VecDeque<usize> = VecDeque::new();
    let counts = valid_prefix(values);

    for i in 0..n {
        let v = values[i];
        if !is_missing(v) {
            while min_q.back().map_or(false, |&j| values[j] >= v) {
                min_q.pop_back();
            }
            min_q.push_back(i);
            while max_q.back().map_or(false, |&j| values[j] <= v) {
                max_q.pop_back();
            }
            max_q.push_back(i);
        }
        let lo = starts[i];
        while min_q.front().map_or(false, |&j| j < lo) {
            min_q.pop_front();
        }
        while max_q.front().map_or(false, |&j| j < lo) {
            max_q.pop_front();
        }
        if counts[i + 1] - counts[lo] >= MIN_PERIODS {
            if let (Some(&a), Some(&b)) = (min_q.front(), max_q.front()) {
                mins[i] = values[a];
                maxs[i] = values[b];
            }
        }
    }
    (mins, maxs)
}

/// Rolling mean and sample standard deviation
pub(crate) fn rolling_mean_std(values: &[f64], starts: &[usize]) -> (Vec<f64>, Vec<f64>) {
    let n = values.len();
    let mut means = vec![f64::NAN; n];
    let mut stds = vec![f64::NAN; n];
    for i in 0..n {
        let (mean, std) = mean_std(&values[starts[i]..=i]);
        means[i] = mean;
        stds[i] = std;
    }
    (means, stds)
}

/// Mean and sample standard deviation of the non-missing values
///
/// Both are NaN with fewer than two values.
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    let (count, sum) = values
        .iter()
        .filter(|v| !is_missing(**v))
        .fold((0usize, 0.0), |(c, s), v| (c + 1, s + v));
    if count < MIN_PERIODS {
        return (f64::NAN, f64::NAN);
    }
    let mean = sum / count as f64;
    let ss: f64 = values
        .iter()
        .filter(|v| !is_missing(**v))
        .map(|v| (v - mean) * (v - mean))
        .sum();
    (mean, (ss / (count - 1) as f64).sqrt())
}

/// Rows of the first minimum and first maximum in `values[range]`
pub(crate) fn arg_min_max(values: &[f64], lo: usize, hi: usize) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for (j, &v) in values.iter().enumerate().take(hi + 1).skip(lo) {
        if is_missing(v) {
            continue;
        }
        best = Some(match best {
            None => (j, j),
            Some((mn, mx)) => (
                if v < values[mn] { j } else { mn },
                if v > values[mx] { j } else { mx },
            ),
        });
    }
    best
}

fn valid_prefix(values: &[f64]) -> Vec<usize> {
    let mut counts = Vec::with_capacity(values.len() + 1);
    counts.push(0);
    let mut c = 0;
    for &v in values {
        if !is_missing(v) {
            c += 1;
        }
        counts.push(c);
    }
    counts
}
