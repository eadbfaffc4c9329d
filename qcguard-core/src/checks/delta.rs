//! Rolling delta check
//!
//! ## Overview
//!
//! Delta is `max - min` over a trailing time window. A small delta means the
//! signal is stagnant; a large one means it changed abruptly.
//!
//! ## Interval reconstruction
//!
//! The rolling statistic crosses a threshold at the *end* of the window, one
//! row after the event that caused it. Reporting that single row would hide
//! the anomaly, so flagged rows are expanded back onto the data that
//! produced them:
//!
//! ```text
//! value:  0    0    10   0          window = 2h, upper bound = 5
//! delta:  -    -    -    10         (first 2h excluded)
//!                        ^ flagged
//! min at row 1, max at row 2  ->  rows 1..=2 fail, row 3 passes
//! ```
//!
//! - **Upper bound**: the flagged row is cleared, then the rows from the
//!   first-occurring extreme to the last-occurring one fail. `Positive` keeps
//!   only min-before-max spans and `Negative` only max-before-min spans.
//!   When min and max coincide the flagged row fails.
//! - **Lower bound**: the whole trailing window fails. With a direction set,
//!   only windows whose min/max order matches the direction fail.
//!
//! Extremes are located by their first occurrence inside the window.
//!
//! Rows within one window of the first timestamp lack a full history and
//! are not evaluated. When the whole dataset is shorter than one window the
//! available history is used as-is.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::window::{arg_min_max, rolling_min_max, window_starts};
use super::{default_min_failures, Bounds, Flagged};
use crate::dataset::Dataset;
use crate::errors::{QcError, QcResult};
use crate::filter::TimeFilter;
use crate::mask::Mask;
use crate::time::{duration_from_secs, Timestamp};
use crate::translation::Selector;

/// Which change direction an abrupt-change check reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Min occurs before max (rising)
    Positive,
    /// Max occurs before min (falling)
    Negative,
}

/// Options for the delta check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaCheck {
    /// Accepted delta range
    pub bounds: Bounds,
    /// Trailing window in seconds
    pub window: f64,
    /// Columns to check
    #[serde(default)]
    pub selector: Selector,
    /// Report only one change direction
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Shortest failed run to report
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
}

impl DeltaCheck {
    /// Delta check over all columns
    pub fn new(bounds: Bounds, window: f64) -> Self {
        Self { bounds, window, selector: Selector::All, direction: None, min_failures: 1 }
    }

    /// Restrict to a selector
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Report only one direction
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Set the shortest reported run
    pub fn min_failures(mut self, n: usize) -> Self {
        self.min_failures = n;
        self
    }

    /// Label prefix
    pub fn prefix(&self) -> &'static str {
        match self.direction {
            Some(Direction::Positive) => "Delta (+)",
            Some(Direction::Negative) => "Delta (-)",
            None => "Delta",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Lower,
    Upper,
}

/// Rolling `max - min`, NaN where the window is too sparse or too early
pub fn rolling_delta(data: &Dataset, window: Duration) -> QcResult<Dataset> {
    if !data.is_monotonic() {
        return Err(QcError::NonMonotonicIndex);
    }
    let index = data.index();
    let starts = window_starts(index, window);
    let cutoff = evaluation_start(index, window);

    let mut out = Dataset::new(index.to_vec());
    for col in data.columns() {
        let (mins, maxs) = rolling_min_max(&col.values, &starts);
        let delta = mins
            .iter()
            .zip(&maxs)
            .enumerate()
            .map(|(i, (mn, mx))| if i < cutoff { f64::NAN } else { mx - mn })
            .collect();
        out.insert_column(col.name.clone(), delta)?;
    }
    Ok(out)
}

// First row past `t0 + window`, or 0 when the data never gets that far.
fn evaluation_start(index: &[Timestamp], window: Duration) -> usize {
    match (index.first(), index.last()) {
        (Some(&first), Some(&last)) if last - first > window => {
            let edge = first + window;
            index.partition_point(|&t| t <= edge)
        }
        _ => 0,
    }
}

/// Delta masks for `data`, lower bound first
///
/// `filter` clears excluded rows before reconstruction so they cannot seed
/// an expanded span.
pub fn delta_masks(data: &Dataset, opts: &DeltaCheck, filter: Option<&TimeFilter>) -> QcResult<Vec<Flagged>> {
    opts.bounds.validate()?;
    let window = duration_from_secs(opts.window)?;
    let delta = rolling_delta(data, window)?;
    let starts = window_starts(data.index(), window);
    let prefix = opts.prefix();

    let mut out = Vec::with_capacity(2);
    if let Some(lb) = opts.bounds.lower {
        let mut point = super::map_mask(&delta, |d| !(d < lb));
        if let Some(f) = filter {
            f.apply(&mut point);
        }
        out.push(Flagged {
            label: Bounds::lower_label(prefix, lb),
            mask: reconstruct(&point, data, &starts, Side::Lower, opts.direction),
        });
    }
    if let Some(ub) = opts.bounds.upper {
        let mut point = super::map_mask(&delta, |d| !(d > ub));
        if let Some(f) = filter {
            f.apply(&mut point);
        }
        out.push(Flagged {
            label: Bounds::upper_label(prefix, ub),
            mask: reconstruct(&point, data, &starts, Side::Upper, opts.direction),
        });
    }
    Ok(out)
}

fn reconstruct(point: &Mask, data: &Dataset, starts: &[usize], side: Side, direction: Option<Direction>) -> Mask {
    let index = data.index();
    let mut out = Mask::filled(index, point.column_names(), true);

    for (col, column) in data.columns().iter().enumerate() {
        let values = &column.values;
        let flagged: Vec<usize> = point
            .column(col)
            .iter()
            .enumerate()
            .filter_map(|(row, &pass)| (!pass).then_some(row))
            .collect();

        for it in flagged {
            let lo = starts[it];
            let cells = out.column_mut(col);

            if side == Side::Lower && direction.is_none() {
                cells[lo..=it].iter_mut().for_each(|c| *c = false);
                continue;
            }
            let Some((min_row, max_row)) = arg_min_max(values, lo, it) else {
                continue;
            };
            let (t_min, t_max) = (index[min_row], index[max_row]);

            match side {
                Side::Lower => {
                    let matches = match direction {
                        Some(Direction::Positive) => t_min <= t_max,
                        Some(Direction::Negative) => t_min >= t_max,
                        None => true,
                    };
                    if matches {
                        cells[lo..=it].iter_mut().for_each(|c| *c = false);
                    }
                }
                Side::Upper => {
                    cells[it] = true;
                    let rising = direction != Some(Direction::Negative);
                    let falling = direction != Some(Direction::Positive);
                    if t_min < t_max && rising {
                        fail_between(cells, index, t_min, t_max);
                    } else if t_min > t_max && falling {
                        fail_between(cells, index, t_max, t_min);
                    } else if t_min == t_max {
                        cells[it] = false;
                    }
                }
            }
        }
    }
    out
}

fn fail_between(cells: &mut [bool], index: &[Timestamp], from: Timestamp, to: Timestamp) {
    let lo = index.partition_point(|&t| t < from);
    let hi = index.partition_point(|&t| t <= to);
    for cell in &mut cells[lo..hi] {
        *cell = false;
    }
}
