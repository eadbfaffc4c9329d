//! Reference datasets with known failures
//!
//! Each scenario carries hand-checked expectations so tests can assert exact
//! interval boundaries rather than loose counts.

use qcguard_core::{Dataset, MISSING};

use super::{frame, hourly, midnight, regular_index};

/// Column A: small noise, a jump at 14:00, then a plateau near 10.
pub const DELTA_A: [f64; 24] = [
    0.5, -0.3, 0.2, 0.0, 0.5, -0.45, 0.35, -0.4, 0.5, 1.5, 0.5, -0.5, 0.5, -0.5, 5.0, 6.0, 10.0, 10.5, 10.0, 10.3,
    10.0, 10.8, 10.0, 9.9,
];

/// Column B: a ramp, a fall between 10:00 and 12:00, a rise between 16:00
/// and 19:00, and one missing value.
pub const DELTA_B: [f64; 24] = [
    0.0, 1.0, 2.2, 3.0, 3.8, 5.0, 6.0, 7.1, 8.0, 9.0, 10.0, 5.0, -2.0, 1.0, 0.0, 0.5, 0.0, 5.0, 3.0, 9.5, 8.2, 7.0,
    MISSING, 5.0,
];

/// Hourly series with one high outlier at 06:00 and one low outlier at 19:00.
pub const OUTLIER_A: [f64; 24] = [
    112.0, 114.0, 113.0, 132.0, 134.0, 127.0, 150.0, 120.0, 117.0, 112.0, 107.0, 99.0, 140.0, 98.0, 88.0, 98.0, 106.0,
    110.0, 107.0, 79.0, 102.0, 115.0, MISSING, 91.0,
];

/// 24 hourly rows of `DELTA_A` and `DELTA_B`
pub fn delta_dataset() -> Dataset {
    frame(hourly(24), vec![("A", DELTA_A.to_vec()), ("B", DELTA_B.to_vec())])
}

/// 24 hourly rows of `OUTLIER_A`
pub fn outlier_dataset() -> Dataset {
    frame(hourly(24), vec![("A", OUTLIER_A.to_vec())])
}

/// Two wave sensors sampled every 15 minutes with a gap, a duplicate, a
/// corrupt sentinel, and an out-of-range spike.
///
/// Rows (before any check):
///
/// ```text
/// 00:00 00:15 00:30 00:30 00:45 [01:00 absent] 01:15 01:30
/// ```
pub fn wave_dataset() -> Dataset {
    let t0 = midnight(2016, 10, 17);
    let mut index = regular_index(t0, 4, 900);
    index.insert(3, index[2]);
    index.extend(regular_index(t0 + chrono::Duration::minutes(75), 2, 900));
    frame(
        index,
        vec![
            ("Wave1", vec![0.5, 0.6, 0.7, 0.8, 0.6, 0.5, 0.4]),
            ("Wave2", vec![0.4, -999.0, 0.6, 0.6, 12.0, MISSING, 0.5]),
        ],
    )
}
