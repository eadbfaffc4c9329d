//! One-shot checks
//!
//! Each function builds a throwaway [`QcEngine`], loads `data`, runs a single
//! check, and returns everything a caller usually wants from it. Warnings go
//! to the `log` facade.

use crate::checks::{
    CorruptCheck, CustomStaticCheck, CustomStreamingCheck, DeltaCheck, IncrementCheck, MissingCheck, OutlierCheck,
    PointClassifier, RangeCheck, StaticClassifier, TimestampCheck,
};
use crate::dataset::Dataset;
use crate::engine::QcEngine;
use crate::interval::FailureInterval;
use crate::mask::Mask;

/// Output of a one-shot check
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Dataset with failed cells set to missing
    pub cleaned_data: Dataset,
    /// Pass/fail grid
    pub mask: Mask,
    /// Failure intervals
    pub results: Vec<FailureInterval>,
    /// Classifier metadata for custom checks
    pub metadata: Option<Dataset>,
}

fn run(data: Dataset, check: impl FnOnce(&mut QcEngine) -> Option<Dataset>) -> CheckReport {
    let mut engine = QcEngine::new();
    engine.add_dataset(data);
    let metadata = check(&mut engine);
    CheckReport {
        cleaned_data: engine.cleaned_data(),
        mask: engine.mask(),
        results: engine.results().to_vec(),
        metadata,
    }
}

/// See [`QcEngine::check_timestamp`]
pub fn check_timestamp(data: Dataset, opts: &TimestampCheck) -> CheckReport {
    run(data, |e| {
        e.check_timestamp(opts);
        None
    })
}

/// See [`QcEngine::check_range`]
pub fn check_range(data: Dataset, opts: &RangeCheck) -> CheckReport {
    run(data, |e| {
        e.check_range(opts);
        None
    })
}

/// See [`QcEngine::check_increment`]
pub fn check_increment(data: Dataset, opts: &IncrementCheck) -> CheckReport {
    run(data, |e| {
        e.check_increment(opts);
        None
    })
}

/// See [`QcEngine::check_delta`]
pub fn check_delta(data: Dataset, opts: &DeltaCheck) -> CheckReport {
    run(data, |e| {
        e.check_delta(opts);
        None
    })
}

/// See [`QcEngine::check_outlier`]
pub fn check_outlier(data: Dataset, opts: &OutlierCheck) -> CheckReport {
    run(data, |e| {
        e.check_outlier(opts);
        None
    })
}

/// See [`QcEngine::check_missing`]
pub fn check_missing(data: Dataset, opts: &MissingCheck) -> CheckReport {
    run(data, |e| {
        e.check_missing(opts);
        None
    })
}

/// See [`QcEngine::check_corrupt`]
pub fn check_corrupt(data: Dataset, opts: &CorruptCheck) -> CheckReport {
    run(data, |e| {
        e.check_corrupt(opts);
        None
    })
}

/// See [`QcEngine::check_custom_static`]
pub fn check_custom_static<C>(data: Dataset, opts: &CustomStaticCheck, classifier: &mut C) -> CheckReport
where
    C: StaticClassifier + ?Sized,
{
    run(data, |e| e.check_custom_static(opts, classifier))
}

/// See [`QcEngine::check_custom_streaming`]
pub fn check_custom_streaming<C>(data: Dataset, opts: &CustomStreamingCheck, classifier: &mut C) -> CheckReport
where
    C: PointClassifier + ?Sized,
{
    run(data, |e| e.check_custom_streaming(opts, classifier).map(|r| r.metadata))
}
