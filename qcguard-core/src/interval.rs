//! Failure interval extraction
//!
//! ## Overview
//!
//! Every check produces a pass/fail [`Mask`]. The extractor compresses each
//! column of that mask into maximal runs of failed cells:
//!
//! ```text
//! row:    0  1  2  3  4  5  6
//! pass:   T  F  F  T  F  T  F
//!            └──┘     │     │
//!            run 1-2  4     6      (min_failures = 1: three intervals)
//!                                  (min_failures = 2: one interval, rows 1-2)
//! ```
//!
//! A run starts where a failed cell follows a passing cell (or the first
//! row) and stops where a failed cell precedes a passing cell (or the last
//! row). Runs shorter than `min_failures` are dropped, never merged.
//!
//! ## Design
//!
//! The extractor is a single transition-detecting pass per column, so the
//! cost is linear in `rows x columns` regardless of how many intervals come
//! out. Output order is by column, then by start row.

use serde::{Deserialize, Serialize};

use crate::mask::Mask;
use crate::time::Timestamp;

/// Label for timestamps earlier than their predecessor
pub const NONMONOTONIC_TIMESTAMP: &str = "Nonmonotonic timestamp";
/// Label for repeated timestamps
pub const DUPLICATE_TIMESTAMP: &str = "Duplicate timestamp";
/// Label for expected timestamps absent from the data
pub const MISSING_TIMESTAMP: &str = "Missing timestamp";
/// Label for missing values
pub const MISSING_DATA: &str = "Missing data";
/// Label for values in the corrupt set
pub const CORRUPT_DATA: &str = "Corrupt data";

/// Labels reporting tools drop before drawing per-variable charts
pub const NON_GRAPHIC_FLAGS: [&str; 5] = [
    DUPLICATE_TIMESTAMP,
    NONMONOTONIC_TIMESTAMP,
    MISSING_TIMESTAMP,
    MISSING_DATA,
    CORRUPT_DATA,
];

/// True for labels produced by the timestamp integrity check
pub fn is_timestamp_flag(flag: &str) -> bool {
    matches!(flag, NONMONOTONIC_TIMESTAMP | DUPLICATE_TIMESTAMP | MISSING_TIMESTAMP)
}

/// One contiguous run of failed timestamps for one variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInterval {
    /// Column name, empty for index-wide timestamp failures
    pub variable: String,
    /// First failed timestamp
    pub start: Timestamp,
    /// Last failed timestamp
    pub end: Timestamp,
    /// Number of failed rows in the run
    pub timesteps: usize,
    /// Error label
    pub error_flag: String,
}

impl FailureInterval {
    /// True when the interval applies to every column
    pub fn is_index_wide(&self) -> bool {
        self.variable.is_empty()
    }
}

/// Compress failed runs of `mask` into intervals
///
/// `min_failures` of 0 behaves like 1. With `timestamp_test` set, the
/// variable name is left empty.
pub fn extract_intervals(
    mask: &Mask,
    error_flag: &str,
    min_failures: usize,
    timestamp_test: bool,
) -> Vec<FailureInterval> {
    let min_failures = min_failures.max(1);
    let index = mask.index();
    let rows = mask.rows();
    let mut out = Vec::new();

    if rows == 0 || mask.all_pass() {
        return out;
    }

    for (col, name) in mask.column_names().iter().enumerate() {
        let cells = mask.column(col);
        let mut run_start: Option<usize> = None;

        for (row, &pass) in cells.iter().enumerate() {
            match (run_start, pass) {
                (None, false) => run_start = Some(row),
                (Some(start), true) => {
                    push_run(&mut out, index, name, start, row - 1, error_flag, min_failures, timestamp_test);
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            push_run(&mut out, index, name, start, rows - 1, error_flag, min_failures, timestamp_test);
        }
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn push_run(
    out: &mut Vec<FailureInterval>,
    index: &[Timestamp],
    name: &str,
    start: usize,
    stop: usize,
    error_flag: &str,
    min_failures: usize,
    timestamp_test: bool,
) {
    let timesteps = stop - start + 1;
    if timesteps < min_failures {
        return;
    }
    out.push(FailureInterval {
        variable: if timestamp_test { String::new() } else { name.to_string() },
        start: index[start],
        end: index[stop],
        timesteps,
        error_flag: error_flag.to_string(),
    });
}

/// Mark every interval on `mask`
///
/// Intervals for a column the mask holds fail that column between their
/// start and end inclusive. An index-wide [`MISSING_TIMESTAMP`] interval
/// fails every column; other index-wide intervals and unknown variables are
/// ignored.
pub fn apply_intervals<'a, I>(mask: &mut Mask, intervals: I)
where
    I: IntoIterator<Item = &'a FailureInterval>,
{
    for interval in intervals {
        if let Some(col) = mask.column_names().iter().position(|n| n == &interval.variable) {
            mask.fill_between(col, interval.start, interval.end, false);
        } else if interval.error_flag == MISSING_TIMESTAMP {
            for col in 0..mask.width() {
                mask.fill_between(col, interval.start, interval.end, false);
            }
        }
    }
}
