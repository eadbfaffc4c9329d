//! Declarative QC plans for QCGuard
//!
//! ## Overview
//!
//! A [`QcPlan`] is the serializable form of a QC run: translation keys, an
//! optional timestamp check, an optional clock-time filter, and an ordered
//! list of value checks. Plans are written as JSON and applied to a
//! [`QcEngine`](qcguard_core::QcEngine); a [`RunSummary`] captures the
//! outcome for storage or reporting.
//!
//! ```text
//! plan.json ──> QcPlan::from_path ──> validate ──> apply(engine) ──> RunSummary
//! ```
//!
//! ## Plan format
//!
//! ```json
//! {
//!   "translations": { "Wave": ["Wave1", "Wave2"] },
//!   "timestamp": { "frequency": 900 },
//!   "time_filter": { "after": 10800, "before": 75600 },
//!   "checks": [
//!     { "type": "missing" },
//!     { "type": "corrupt", "corrupt_values": [-999] },
//!     { "type": "range", "bounds": { "lower": 0, "upper": 5 }, "selector": { "key": "Wave" } },
//!     { "type": "delta", "bounds": { "lower": 0.0001 }, "window": 3600 }
//!   ],
//!   "qci_columns": ["Wave1", "Wave2"]
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod plan;
pub mod summary;

use std::path::PathBuf;

use qcguard_core::QcError;
use thiserror::Error;

pub use plan::{CheckSpec, ClockWindow, PlanOutcome, QcPlan};
pub use summary::RunSummary;

/// Errors raised while loading, validating, or writing plans
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Plan or summary file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Plan is not valid JSON for the plan schema
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A check in the plan has invalid options
    #[error("Check #{index} ({kind}) is invalid: {source}")]
    Check {
        /// Position in the `checks` list
        index: usize,
        /// Check type name
        kind: &'static str,
        /// Reason reported by the core crate
        #[source]
        source: QcError,
    },

    /// Plan-level option is invalid
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

/// Result alias for this crate
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
