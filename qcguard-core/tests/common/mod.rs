//! Shared fixtures for integration tests
//!
//! Provides hourly and quarter-hourly index builders, the reference
//! datasets used across the scenario tests, and small assertion helpers
//! for failure intervals.

#![allow(dead_code)]

pub mod scenarios;

use chrono::{Duration, NaiveDate};
use qcguard_core::{Dataset, FailureInterval, Timestamp};

/// Midnight on the given date
pub fn midnight(year: i32, month: u32, day: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(year, month, day).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

/// `n` timestamps `step_secs` apart starting at `start`
pub fn regular_index(start: Timestamp, n: usize, step_secs: i64) -> Vec<Timestamp> {
    (0..n).map(|i| start + Duration::seconds(step_secs * i as i64)).collect()
}

/// Hourly index starting 2017-01-01
pub fn hourly(n: usize) -> Vec<Timestamp> {
    regular_index(midnight(2017, 1, 1), n, 3600)
}

/// Timestamp `h` hours after 2017-01-01 00:00
pub fn hour(h: i64) -> Timestamp {
    midnight(2017, 1, 1) + Duration::hours(h)
}

/// Build a dataset from named columns
pub fn frame(index: Vec<Timestamp>, columns: Vec<(&str, Vec<f64>)>) -> Dataset {
    Dataset::from_columns(index, columns).unwrap()
}

/// `(variable, start, end, timesteps)` of an interval, for compact asserts
pub fn span(r: &FailureInterval) -> (&str, Timestamp, Timestamp, usize) {
    (r.variable.as_str(), r.start, r.end, r.timesteps)
}

/// Total failed timesteps across `results`
pub fn total_timesteps(results: &[FailureInterval]) -> usize {
    results.iter().map(|r| r.timesteps).sum()
}
