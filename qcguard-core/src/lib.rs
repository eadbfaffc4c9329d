//! Core quality-control engine for QCGuard
//!
//! Screens multivariate time series for missing, corrupt, out-of-range,
//! stagnant, abruptly changing, and statistically anomalous values, and
//! records every failure as a time-bounded [`FailureInterval`].
//!
//! Key properties:
//! - Every check either appends all of its intervals or none
//! - Misconfigured checks are logged and skipped, never fatal
//! - Mask and cleaned-data views are derived from the result list on demand
//!
//! ```no_run
//! use qcguard_core::{Bounds, DeltaCheck, MissingCheck, QcEngine, TimestampCheck};
//! # fn load() -> qcguard_core::Dataset { unimplemented!() }
//!
//! let mut engine = QcEngine::new();
//! engine.add_dataset(load());
//! engine.add_translation("Wave", ["Wave1", "Wave2"]);
//!
//! engine.check_timestamp(&TimestampCheck::new(900.0));
//! engine.check_missing(&MissingCheck::new());
//! engine.check_delta(&DeltaCheck::new(Bounds::lower(0.0001), 3600.0));
//!
//! for r in engine.results() {
//!     println!("{} {} -> {} ({}) {}", r.variable, r.start, r.end, r.timesteps, r.error_flag);
//! }
//! println!("QCI = {:.3}", engine.quality_index().mean());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod checks;
pub mod dataset;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod filter;
pub mod functional;
pub mod interval;
pub mod mask;
pub mod metrics;
pub mod time;
pub mod translation;

// Public API
pub use checks::{
    Bounds, CorruptCheck, CustomStaticCheck, CustomStreamingCheck, DeltaCheck, Direction, History, IncrementCheck,
    MissingCheck, OutlierCheck, PointClassifier, PointVerdict, RangeCheck, StaticClassifier, StaticOutput,
    TimestampCheck,
};
pub use dataset::{is_missing, Dataset, MISSING};
pub use diagnostics::{Diagnostic, DiagnosticSink, Level, LogSink, MemorySink, TeeSink};
pub use engine::{QcEngine, StreamingReport};
pub use errors::{QcError, QcResult};
pub use filter::TimeFilter;
pub use interval::{extract_intervals, FailureInterval};
pub use mask::Mask;
pub use metrics::{qci, ColumnSeries};
pub use time::Timestamp;
pub use translation::{Selector, TranslationRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
