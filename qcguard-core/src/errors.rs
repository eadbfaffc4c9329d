//! Error Types for Quality-Control Operations
//!
//! ## Design Philosophy
//!
//! QC runs are batch jobs over a loaded dataset. A single misconfigured check
//! must never abort the remaining checks, so errors are split by who sees them:
//!
//! 1. **Pure functions** (time utilities, metrics, check kernels) return
//!    [`QcResult`] and let the caller decide.
//!
//! 2. **Engine checks** compute their full interval list as a `QcResult` first.
//!    On `Err` the engine reports a warning through its diagnostics sink and
//!    appends nothing. Results are therefore all-or-nothing per call.
//!
//! ## Error Categories
//!
//! ### Configuration errors
//! - `UndefinedKey` / `UndefinedColumn`: selector does not resolve
//! - `InvalidBound`: a bound is NaN or infinite
//! - `InvalidWindow` / `InvalidFrequency`: non-positive or sub-millisecond durations
//! - `InvalidFraction`: rebase threshold outside `[0, 1]`
//! - `InvalidTime`: a numeric offset that maps outside the calendar
//! - `InvalidTimeRange`: expected start after expected end
//! - `InvalidIncrement`: an increment of zero rows
//!
//! ### Data errors
//! - `EmptyDataset`: nothing to check
//! - `AllNull`: every selected value is missing
//! - `NonMonotonicIndex`: a windowed check needs a sorted index
//!
//! ### Shape errors
//! - `LengthMismatch`: index, column, or filter lengths disagree
//! - `ColumnMismatch`: two frames given to a metric do not share columns
//! - `ClassifierShape`: a custom classifier returned the wrong shape
//! - `ClassifierLayout`: classifier output has the right length but other columns or timestamps
//!
//! ## Example
//!
//! ```rust
//! use qcguard_core::{QcError, time::duration_from_secs};
//!
//! match duration_from_secs(-5.0) {
//!     Err(QcError::InvalidWindow { .. }) => {}
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use thiserror_no_std::Error;

use crate::time::Timestamp;

/// Result type for QC operations
pub type QcResult<T> = Result<T, QcError>;

/// Errors raised while configuring or running a QC check
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QcError {
    /// The engine holds no rows (or no columns)
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Translation key not present in the registry
    #[error("Undefined translation key '{key}'")]
    UndefinedKey {
        /// The key that failed to resolve
        key: String,
    },

    /// Column not present in the dataset
    #[error("Undefined column '{column}'")]
    UndefinedColumn {
        /// The missing column name
        column: String,
    },

    /// Two aligned sequences differ in length
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        /// What was being aligned
        what: &'static str,
        /// Expected length (usually the index length)
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// Bound is NaN or infinite
    #[error("Invalid bound {value}: bounds must be finite")]
    InvalidBound {
        /// Offending bound
        value: f64,
    },

    /// Window duration must be positive and at least one millisecond
    #[error("Invalid window {seconds}s: must be at least 0.001s")]
    InvalidWindow {
        /// Requested window in seconds
        seconds: f64,
    },

    /// Frequency must be positive and at least one millisecond
    #[error("Invalid frequency {seconds}s: must be at least 0.001s")]
    InvalidFrequency {
        /// Requested frequency in seconds
        seconds: f64,
    },

    /// Fraction argument outside `[0, 1]`
    #[error("Invalid fraction {value}: must lie in [0, 1]")]
    InvalidFraction {
        /// Offending fraction
        value: f64,
    },

    /// Numeric time offset cannot be represented as a timestamp
    #[error("Time value {value} is not representable as a timestamp")]
    InvalidTime {
        /// Offending offset or epoch value
        value: f64,
    },

    /// Expected start lies after expected end
    #[error("Expected start {start} is after expected end {end}")]
    InvalidTimeRange {
        /// Expected first timestamp
        start: Timestamp,
        /// Expected last timestamp
        end: Timestamp,
    },

    /// Windowed checks require a sorted index
    #[error("Index is not monotonic; run the timestamp check first")]
    NonMonotonicIndex,

    /// Every selected value is missing
    #[error("All selected data is missing")]
    AllNull,

    /// Metric inputs do not share the same columns
    #[error("Column mismatch: {left:?} vs {right:?}")]
    ColumnMismatch {
        /// Columns of the first frame
        left: Vec<String>,
        /// Columns of the second frame
        right: Vec<String>,
    },

    /// Custom classifier output did not match the input shape
    #[error("Classifier returned {actual} values, expected {expected}")]
    ClassifierShape {
        /// Expected number of values
        expected: usize,
        /// Number returned
        actual: usize,
    },

    /// Custom classifier output is labelled differently from its input
    #[error("Classifier {part} does not match the input dataset")]
    ClassifierLayout {
        /// Which part disagrees: mask columns, mask index, or metadata index
        part: &'static str,
    },

    /// Increment checks compare against at least the previous row
    #[error("Invalid increment {increment}: must be at least one row")]
    InvalidIncrement {
        /// Requested row offset
        increment: usize,
    },
}

impl QcError {
    /// True for errors caused by caller configuration rather than data
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            QcError::UndefinedKey { .. }
                | QcError::UndefinedColumn { .. }
                | QcError::InvalidBound { .. }
                | QcError::InvalidWindow { .. }
                | QcError::InvalidFrequency { .. }
                | QcError::InvalidFraction { .. }
                | QcError::InvalidTimeRange { .. }
                | QcError::InvalidIncrement { .. }
                | QcError::NonMonotonicIndex
        )
    }
}
