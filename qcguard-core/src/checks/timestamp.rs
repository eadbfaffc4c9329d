//! Timestamp integrity check
//!
//! ## Overview
//!
//! Runs once, before the value checks, and is the only check that reshapes
//! the dataset. Sub-checks run in a fixed order because each one depends on
//! the index the previous one left behind:
//!
//! ```text
//! raw index ──> 1. non-monotonic (original order, first row passes)
//!           ──> 2. stable sort
//!           ──> 3. duplicates (sorted order), then drop repeats keeping the first row
//!           ──> 4. missing timestamps against the expected grid
//! ```
//!
//! ## Duplicates
//!
//! A timestamp that occurs `k > 1` times is reported once, at the position
//! of its last occurrence, while the row that survives de-duplication is the
//! first occurrence. The mask is built over the unique timestamps.
//!
//! ## Missing timestamps
//!
//! - **Exact** (`exact_times = true`): the dataset is reindexed onto the
//!   expected grid `start, start + f, ..., <= end`. Grid points with no row
//!   become all-missing rows and fail; rows off the grid are dropped.
//! - **Tolerant**: timestamps are bucketed into bins of width `f` aligned to
//!   midnight of the expected start's day. Every bin from the one holding
//!   the start to the one holding the end must hold at least one row; empty
//!   bins fail, labelled by their left edge. The dataset is not reindexed.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{default_min_failures, default_true, Flagged};
use crate::dataset::Dataset;
use crate::errors::{QcError, QcResult};
use crate::interval::{DUPLICATE_TIMESTAMP, MISSING_TIMESTAMP, NONMONOTONIC_TIMESTAMP};
use crate::mask::Mask;
use crate::time::{date_range, frequency_from_secs, start_of_day, Timestamp};

/// Options for the timestamp check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampCheck {
    /// Expected sampling interval in seconds
    pub frequency: f64,
    /// Expected first timestamp (defaults to the observed minimum)
    #[serde(default)]
    pub expected_start: Option<Timestamp>,
    /// Expected last timestamp (defaults to the observed maximum)
    #[serde(default)]
    pub expected_end: Option<Timestamp>,
    /// Shortest failed run to report
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
    /// Require timestamps exactly on the grid
    #[serde(default = "default_true")]
    pub exact_times: bool,
}

impl TimestampCheck {
    /// Exact-grid check at `frequency` seconds
    pub fn new(frequency: f64) -> Self {
        Self {
            frequency,
            expected_start: None,
            expected_end: None,
            min_failures: 1,
            exact_times: true,
        }
    }

    /// Expected first timestamp
    pub fn expected_start(mut self, t: Timestamp) -> Self {
        self.expected_start = Some(t);
        self
    }

    /// Expected last timestamp
    pub fn expected_end(mut self, t: Timestamp) -> Self {
        self.expected_end = Some(t);
        self
    }

    /// Set the shortest reported run
    pub fn min_failures(mut self, n: usize) -> Self {
        self.min_failures = n;
        self
    }

    /// Bin-based tolerant mode when `false`
    pub fn exact_times(mut self, exact: bool) -> Self {
        self.exact_times = exact;
        self
    }
}

/// Result of the timestamp check
#[derive(Debug, Clone)]
pub struct TimestampOutcome {
    /// Sorted, de-duplicated (and in exact mode, reindexed) dataset
    pub data: Dataset,
    /// Non-monotonic, duplicate, and missing-timestamp masks, in that order
    pub flagged: Vec<Flagged>,
}

/// Run all timestamp sub-checks on a copy of `data`
pub fn timestamp_masks(data: &Dataset, opts: &TimestampCheck) -> QcResult<TimestampOutcome> {
    let freq = frequency_from_secs(opts.frequency)?;
    let index = data.index();
    let (Some(&observed_min), Some(&observed_max)) = (index.iter().min(), index.iter().max()) else {
        return Err(QcError::EmptyDataset);
    };
    let start = opts.expected_start.unwrap_or(observed_min);
    let end = opts.expected_end.unwrap_or(observed_max);
    if end < start {
        return Err(QcError::InvalidTimeRange { start, end });
    }

    let mut flagged = Vec::with_capacity(3);
    flagged.push(Flagged { label: NONMONOTONIC_TIMESTAMP.to_string(), mask: nonmonotonic_mask(index) });

    let mut data = data.clone();
    data.sort_by_index();
    flagged.push(Flagged { label: DUPLICATE_TIMESTAMP.to_string(), mask: duplicate_mask(data.index()) });
    data.dedup_index_keep_first();

    let missing = if opts.exact_times {
        let grid = date_range(start, end, freq);
        let present: Vec<bool> = {
            let existing: std::collections::HashSet<Timestamp> = data.index().iter().copied().collect();
            grid.iter().map(|t| existing.contains(t)).collect()
        };
        data = data.reindex(&grid);
        Mask::single(grid, present)
    } else {
        tolerant_mask(data.index(), start, end, freq)
    };
    flagged.push(Flagged { label: MISSING_TIMESTAMP.to_string(), mask: missing });

    Ok(TimestampOutcome { data, flagged })
}

fn nonmonotonic_mask(index: &[Timestamp]) -> Mask {
    let cells = (0..index.len()).map(|i| i == 0 || index[i] >= index[i - 1]).collect();
    Mask::single(index.to_vec(), cells)
}

// One cell per unique timestamp, failing at the last row of any repeated run.
fn duplicate_mask(sorted: &[Timestamp]) -> Mask {
    let mut unique = Vec::with_capacity(sorted.len());
    let mut cells = Vec::with_capacity(sorted.len());
    for (i, &t) in sorted.iter().enumerate() {
        let repeated = i > 0 && sorted[i - 1] == t;
        if repeated {
            if let Some(last) = cells.last_mut() {
                *last = false;
            }
        } else {
            unique.push(t);
            cells.push(true);
        }
    }
    Mask::single(unique, cells)
}

fn tolerant_mask(index: &[Timestamp], start: Timestamp, end: Timestamp, freq: Duration) -> Mask {
    let origin = start_of_day(start);
    let step = freq.num_milliseconds();
    let bin = |t: Timestamp| (t - origin).num_milliseconds().div_euclid(step);

    let first = bin(start);
    let last = bin(end);
    let mut counts = vec![0usize; (last - first + 1) as usize];
    for &t in index {
        if t < start || t > end {
            continue;
        }
        counts[(bin(t) - first) as usize] += 1;
    }

    let edges = (first..=last).map(|k| origin + Duration::milliseconds(k * step)).collect();
    Mask::single(edges, counts.iter().map(|&c| c > 0).collect())
}
