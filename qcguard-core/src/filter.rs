//! Time filter
//!
//! Restricts which timestamps are eligible to fail. The filter is keyed by
//! timestamp rather than row, so it stays valid after the timestamp check
//! sorts or reindexes the dataset. Timestamps the filter does not know about
//! (rows inserted for missing timestamps, for example) are included.
//!
//! Because flags are keyed by timestamp, a duplicated timestamp holds a
//! single flag: when an index repeats a timestamp, the flag given for its
//! last occurrence wins and applies to every row at that time.

use std::collections::HashMap;

use crate::errors::{QcError, QcResult};
use crate::mask::Mask;
use crate::time::{clock_seconds, Timestamp};

/// Inclusion flag per timestamp (`true` = evaluate)
///
/// Duplicate timestamps collapse to one entry; the last flag wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeFilter {
    flags: HashMap<Timestamp, bool>,
}

impl TimeFilter {
    /// Filter from aligned timestamps and flags
    pub fn new(index: &[Timestamp], include: &[bool]) -> QcResult<Self> {
        if index.len() != include.len() {
            return Err(QcError::LengthMismatch {
                what: "time filter",
                expected: index.len(),
                actual: include.len(),
            });
        }
        Ok(Self { flags: index.iter().copied().zip(include.iter().copied()).collect() })
    }

    /// Filter computed from each timestamp
    pub fn from_fn(index: &[Timestamp], f: impl Fn(Timestamp) -> bool) -> Self {
        Self { flags: index.iter().map(|&t| (t, f(t))).collect() }
    }

    /// Include timestamps whose clock time lies strictly between `after` and
    /// `before` seconds past midnight
    pub fn clock_window(index: &[Timestamp], after: f64, before: f64) -> Self {
        Self::from_fn(index, |t| {
            let clock = clock_seconds(t);
            clock > after && clock < before
        })
    }

    /// True when `t` is evaluated
    pub fn includes(&self, t: Timestamp) -> bool {
        self.flags.get(&t).copied().unwrap_or(true)
    }

    /// Number of distinct timestamps the filter knows about
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// True when the filter knows no timestamps
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Inclusion flag for every timestamp of `index`
    pub fn flags_for(&self, index: &[Timestamp]) -> Vec<bool> {
        index.iter().map(|&t| self.includes(t)).collect()
    }

    /// Force excluded rows of `mask` to pass
    pub fn apply(&self, mask: &mut Mask) {
        let excluded: Vec<usize> = mask
            .index()
            .iter()
            .enumerate()
            .filter(|(_, t)| !self.includes(**t))
            .map(|(row, _)| row)
            .collect();
        for row in excluded {
            mask.pass_row(row);
        }
    }
}
