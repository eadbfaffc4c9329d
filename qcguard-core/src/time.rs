//! Temporal index utilities
//!
//! Converts between absolute timestamps and the numeric time bases QC code
//! works with:
//! - Elapsed seconds since the first sample (plus an origin offset)
//! - Clock time (seconds past midnight)
//! - Epoch time (seconds since 1970-01-01)
//!
//! All durations are carried at millisecond resolution. Frequencies and
//! windows given in seconds are truncated to whole milliseconds, so anything
//! shorter than 1 ms is rejected.

use chrono::{DateTime, Duration, NaiveDateTime, Timelike};

use crate::errors::{QcError, QcResult};

/// Naive (zone-less) timestamp used for every index
pub type Timestamp = NaiveDateTime;

/// Unit of a numeric time offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// Milliseconds
    Milliseconds,
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
    /// Days
    Days,
}

impl TimeUnit {
    /// Length of one unit in milliseconds
    pub fn millis(self) -> f64 {
        match self {
            TimeUnit::Milliseconds => 1.0,
            TimeUnit::Seconds => 1_000.0,
            TimeUnit::Minutes => 60_000.0,
            TimeUnit::Hours => 3_600_000.0,
            TimeUnit::Days => 86_400_000.0,
        }
    }
}

/// Rounding mode for [`round_index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Nearest grid point, ties to the even multiple
    #[default]
    Nearest,
    /// Grid point at or before the timestamp
    Floor,
    /// Grid point at or after the timestamp
    Ceiling,
}

// Roughly 30,000 years; keeps millisecond arithmetic well inside i64.
const MAX_MILLIS: f64 = 1.0e15;

/// Whole milliseconds in `secs`, or `None` when below 1 ms or non-finite
pub(crate) fn positive_millis(secs: f64) -> Option<i64> {
    if !secs.is_finite() {
        return None;
    }
    let ms = (secs * 1000.0).trunc();
    if ms < 1.0 || ms > MAX_MILLIS {
        None
    } else {
        Some(ms as i64)
    }
}

/// Window duration from seconds, truncated to whole milliseconds
pub fn duration_from_secs(secs: f64) -> QcResult<Duration> {
    positive_millis(secs)
        .map(Duration::milliseconds)
        .ok_or(QcError::InvalidWindow { seconds: secs })
}

/// Sampling frequency from seconds, truncated to whole milliseconds
pub fn frequency_from_secs(secs: f64) -> QcResult<Duration> {
    positive_millis(secs)
        .map(Duration::milliseconds)
        .ok_or(QcError::InvalidFrequency { seconds: secs })
}

/// Signed seconds from `from` to `to`
pub fn seconds_between(from: Timestamp, to: Timestamp) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1.0e9,
        None => delta.num_milliseconds() as f64 / 1.0e3,
    }
}

fn epoch_millis(t: Timestamp) -> i64 {
    t.and_utc().timestamp_millis()
}

fn from_epoch_millis(ms: i64) -> QcResult<Timestamp> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.naive_utc())
        .ok_or(QcError::InvalidTime { value: ms as f64 / 1.0e3 })
}

/// Convert numeric offsets from `origin` into timestamps
///
/// Offsets are scaled by `unit` and rounded to the nearest millisecond.
pub fn index_to_datetime(values: &[f64], unit: TimeUnit, origin: Timestamp) -> QcResult<Vec<Timestamp>> {
    values
        .iter()
        .map(|&v| {
            let ms = (v * unit.millis()).round();
            if !ms.is_finite() || ms.abs() > MAX_MILLIS {
                return Err(QcError::InvalidTime { value: v });
            }
            origin
                .checked_add_signed(Duration::milliseconds(ms as i64))
                .ok_or(QcError::InvalidTime { value: v })
        })
        .collect()
}

/// Seconds elapsed since the first timestamp, shifted by `origin`
pub fn datetime_to_elapsedtime(index: &[Timestamp], origin: f64) -> Vec<f64> {
    match index.first() {
        Some(&first) => index.iter().map(|&t| seconds_between(first, t) + origin).collect(),
        None => Vec::new(),
    }
}

/// Seconds past midnight for each timestamp
pub fn datetime_to_clocktime(index: &[Timestamp]) -> Vec<f64> {
    index.iter().map(|&t| clock_seconds(t)).collect()
}

pub(crate) fn clock_seconds(t: Timestamp) -> f64 {
    t.num_seconds_from_midnight() as f64 + f64::from(t.nanosecond() % 1_000_000_000) / 1.0e9
}

/// Seconds since 1970-01-01 00:00:00 for each timestamp
pub fn datetime_to_epochtime(index: &[Timestamp]) -> Vec<f64> {
    index
        .iter()
        .map(|&t| {
            let utc = t.and_utc();
            utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1.0e9
        })
        .collect()
}

/// Round each timestamp onto an epoch-aligned grid of `frequency` seconds
pub fn round_index(index: &[Timestamp], frequency: f64, how: Rounding) -> QcResult<Vec<Timestamp>> {
    let step = positive_millis(frequency).ok_or(QcError::InvalidFrequency { seconds: frequency })?;

    index
        .iter()
        .map(|&t| {
            let ms = epoch_millis(t);
            let q = ms.div_euclid(step);
            let r = ms.rem_euclid(step);
            let n = match how {
                Rounding::Floor => q,
                Rounding::Ceiling => if r > 0 { q + 1 } else { q },
                Rounding::Nearest => {
                    if 2 * r > step || (2 * r == step && q % 2 != 0) {
                        q + 1
                    } else {
                        q
                    }
                }
            };
            from_epoch_millis(n * step)
        })
        .collect()
}

/// Regular grid from `start` to `end` inclusive
///
/// Returns an empty grid when `end < start` or `step` is not positive.
pub fn date_range(start: Timestamp, end: Timestamp, step: Duration) -> Vec<Timestamp> {
    let mut grid = Vec::new();
    if step <= Duration::zero() {
        return grid;
    }
    let mut t = start;
    while t <= end {
        grid.push(t);
        match t.checked_add_signed(step) {
            Some(next) => t = next,
            None => break,
        }
    }
    grid
}

/// Midnight of the day containing `t`
pub(crate) fn start_of_day(t: Timestamp) -> Timestamp {
    t.date().and_time(chrono::NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2016, 10, 17).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn index_to_datetime_scales_units() {
        let origin = ts(0, 0, 0);
        let out = index_to_datetime(&[0.0, 1.5, 3600.0], TimeUnit::Seconds, origin).unwrap();
        assert_eq!(out[0], origin);
        assert_eq!(out[1], origin + Duration::milliseconds(1500));
        assert_eq!(out[2], ts(1, 0, 0));

        let hours = index_to_datetime(&[2.0], TimeUnit::Hours, origin).unwrap();
        assert_eq!(hours[0], ts(2, 0, 0));
    }

    #[test]
    fn index_to_datetime_rejects_nan() {
        let err = index_to_datetime(&[f64::NAN], TimeUnit::Seconds, ts(0, 0, 0)).unwrap_err();
        assert!(matches!(err, QcError::InvalidTime { .. }));
    }

    #[test]
    fn elapsed_clock_and_epoch() {
        let index = vec![ts(1, 0, 0), ts(1, 0, 30), ts(2, 0, 0)];

        assert_eq!(datetime_to_elapsedtime(&index, 0.0), vec![0.0, 30.0, 3600.0]);
        assert_eq!(datetime_to_elapsedtime(&index, 10.0), vec![10.0, 40.0, 3610.0]);
        assert!(datetime_to_elapsedtime(&[], 0.0).is_empty());

        assert_eq!(datetime_to_clocktime(&index), vec![3600.0, 3630.0, 7200.0]);

        let epoch = datetime_to_epochtime(&index[..1]);
        // 2016-10-17T01:00:00Z
        assert_eq!(epoch[0], 1_476_666_000.0);
    }

    #[test]
    fn round_index_modes() {
        let index = vec![ts(0, 0, 7), ts(0, 0, 15), ts(0, 0, 44)];

        let nearest = round_index(&index, 15.0, Rounding::Nearest).unwrap();
        assert_eq!(nearest, vec![ts(0, 0, 0), ts(0, 0, 15), ts(0, 0, 45)]);

        let floor = round_index(&index, 15.0, Rounding::Floor).unwrap();
        assert_eq!(floor, vec![ts(0, 0, 0), ts(0, 0, 15), ts(0, 0, 30)]);

        let ceil = round_index(&index, 15.0, Rounding::Ceiling).unwrap();
        assert_eq!(ceil, vec![ts(0, 0, 15), ts(0, 0, 15), ts(0, 0, 45)]);
    }

    #[test]
    fn round_index_half_to_even() {
        // 5s lies halfway between 0s and 10s; 15s halfway between 10s and 20s
        let index = vec![ts(0, 0, 5), ts(0, 0, 15)];
        let out = round_index(&index, 10.0, Rounding::Nearest).unwrap();
        assert_eq!(out, vec![ts(0, 0, 0), ts(0, 0, 20)]);
    }

    #[test]
    fn durations_truncate_to_millis() {
        assert_eq!(duration_from_secs(1.0009).unwrap(), Duration::milliseconds(1000));
        assert!(duration_from_secs(0.0).is_err());
        assert!(duration_from_secs(0.0005).is_err());
        assert!(matches!(frequency_from_secs(-1.0), Err(QcError::InvalidFrequency { .. })));
    }

    #[test]
    fn date_range_is_inclusive() {
        let grid = date_range(ts(0, 0, 0), ts(0, 45, 0), Duration::minutes(15));
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[3], ts(0, 45, 0));

        assert!(date_range(ts(1, 0, 0), ts(0, 0, 0), Duration::minutes(15)).is_empty());
        assert_eq!(start_of_day(ts(13, 5, 2)), ts(0, 0, 0));
    }
}
