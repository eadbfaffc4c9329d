//! Quality Control Engine
//!
//! ## Overview
//!
//! [`QcEngine`] owns the dataset, the translation registry, the optional time
//! filter, and the append-only list of [`FailureInterval`]s. Each `check_*`
//! call resolves its selector, runs a kernel from [`crate::checks`], applies
//! the time filter, extracts intervals, and appends them.
//!
//! ```text
//!  add_dataset ─┐
//!               v
//!           ┌────────┐  select   ┌────────┐  Flagged   ┌──────────┐  intervals
//!           │Dataset │ ────────> │ kernel │ ─────────> │ filter + │ ──────────> results
//!           └────────┘           └────────┘            │ extract  │
//!               ^                                      └──────────┘
//!               └── timestamp check / corrupt check write back
//! ```
//!
//! ## Failure policy
//!
//! A check never returns an error. Undefined keys, invalid bounds, an empty
//! dataset, and similar problems are reported as a warning through the
//! engine's [`DiagnosticSink`] and the call appends nothing. Every interval
//! of a call is computed before any is appended, so a call either appends
//! all its results or none.
//!
//! ## Derived views
//!
//! [`QcEngine::mask`] and [`QcEngine::cleaned_data`] are rebuilt from the
//! result list on every call. Nothing is cached.
//!
//! ## Example
//!
//! ```rust
//! use qcguard_core::{Bounds, Dataset, QcEngine, RangeCheck, Selector};
//! use chrono::NaiveDate;
//!
//! let t0 = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let index = (0..4).map(|i| t0 + chrono::Duration::minutes(15 * i)).collect();
//! let data = Dataset::from_columns(index, vec![("Wave", vec![0.5, 9.0, 0.7, 0.6])]).unwrap();
//!
//! let mut engine = QcEngine::new();
//! engine.add_dataset(data);
//! engine.check_range(&RangeCheck::new(Bounds::upper(5.0)).selector(Selector::key("Wave")));
//!
//! assert_eq!(engine.results().len(), 1);
//! assert!(engine.cleaned_data().column("Wave").unwrap()[1].is_nan());
//! ```

use crate::checks::custom::run_static;
use crate::checks::delta::delta_masks;
use crate::checks::missing::{corrupt_mask, missing_mask};
use crate::checks::outlier::{outlier_masks, streaming_classifier, STREAMING_REBASE};
use crate::checks::range::{increment_masks, range_masks};
use crate::checks::streaming::run_streaming;
use crate::checks::timestamp::timestamp_masks;
use crate::checks::{
    CorruptCheck, CustomStaticCheck, CustomStreamingCheck, DeltaCheck, Flagged, IncrementCheck, MissingCheck,
    OutlierCheck, PointClassifier, RangeCheck, StaticClassifier, TimestampCheck,
};
use crate::dataset::{Dataset, MISSING};
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::errors::{QcError, QcResult};
use crate::filter::TimeFilter;
use crate::interval::{apply_intervals, extract_intervals, FailureInterval, MISSING_DATA, MISSING_TIMESTAMP};
use crate::mask::Mask;
use crate::metrics::{qci, ColumnSeries};
use crate::translation::{Selector, TranslationRegistry};

/// Metadata and rebase count from a streaming check
#[derive(Debug, Clone)]
pub struct StreamingReport {
    /// Classifier metadata per evaluated timestamp
    pub metadata: Dataset,
    /// Number of cells restored by rebasing
    pub rebase_count: usize,
}

/// Stateful QC analysis over one dataset
pub struct QcEngine<S: DiagnosticSink = LogSink> {
    data: Dataset,
    translations: TranslationRegistry,
    time_filter: Option<TimeFilter>,
    results: Vec<FailureInterval>,
    diagnostics: S,
}

impl Default for QcEngine<LogSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl QcEngine<LogSink> {
    /// Engine reporting through the `log` facade
    pub fn new() -> Self {
        Self::with_diagnostics(LogSink)
    }
}

impl<S: DiagnosticSink> QcEngine<S> {
    /// Engine reporting through `diagnostics`
    pub fn with_diagnostics(diagnostics: S) -> Self {
        Self {
            data: Dataset::default(),
            translations: TranslationRegistry::new(),
            time_filter: None,
            results: Vec::new(),
            diagnostics,
        }
    }

    // ===== STATE =====

    /// Merge `data` into the engine
    ///
    /// Existing non-missing values win over incoming ones. Every incoming
    /// column gets an identity translation entry.
    pub fn add_dataset(&mut self, data: Dataset) {
        self.data = self.data.combine_first(&data);
        for name in data.column_names() {
            self.translations.insert(name.clone(), [name]);
        }
    }

    /// Register one translation entry, replacing any previous one
    pub fn add_translation<I, T>(&mut self, key: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.translations.insert(key, columns);
    }

    /// Register several translation entries
    pub fn add_translations<I, K, C, T>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.translations.extend(entries);
    }

    /// Restrict which timestamps may fail
    pub fn add_time_filter(&mut self, filter: TimeFilter) {
        self.time_filter = Some(filter);
    }

    /// Remove the time filter
    pub fn clear_time_filter(&mut self) {
        self.time_filter = None;
    }

    /// Current dataset
    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// Translation registry
    pub fn translations(&self) -> &TranslationRegistry {
        &self.translations
    }

    /// Active time filter
    pub fn time_filter(&self) -> Option<&TimeFilter> {
        self.time_filter.as_ref()
    }

    /// Accumulated failure intervals, in append order
    pub fn results(&self) -> &[FailureInterval] {
        &self.results
    }

    /// Diagnostics sink
    pub fn diagnostics(&self) -> &S {
        &self.diagnostics
    }

    /// Mutable diagnostics sink, for callers reporting alongside the checks
    pub fn diagnostics_mut(&mut self) -> &mut S {
        &mut self.diagnostics
    }

    /// Swap the diagnostics sink, returning the previous one
    pub fn replace_diagnostics(&mut self, diagnostics: S) -> S {
        std::mem::replace(&mut self.diagnostics, diagnostics)
    }

    /// Dismantle into dataset, results, and sink
    pub fn into_parts(self) -> (Dataset, Vec<FailureInterval>, S) {
        (self.data, self.results, self.diagnostics)
    }

    // ===== DERIVED VIEWS =====

    /// Pass/fail grid over the dataset from the current results
    pub fn mask(&self) -> Mask {
        let mut mask = Mask::filled(self.data.index(), &self.data.column_names(), true);
        apply_intervals(&mut mask, &self.results);
        mask
    }

    /// Dataset with every failed cell set to missing
    pub fn cleaned_data(&self) -> Dataset {
        let mask = self.mask();
        let mut cleaned = self.data.clone();
        for (col, name) in mask.column_names().iter().enumerate() {
            if let Some(values) = cleaned.column_mut(name) {
                for (v, &pass) in values.iter_mut().zip(mask.column(col)) {
                    if !pass {
                        *v = MISSING;
                    }
                }
            }
        }
        cleaned
    }

    /// Quality index of the current mask under the engine's time filter
    pub fn quality_index(&self) -> ColumnSeries {
        qci(&self.mask(), self.time_filter.as_ref())
    }

    // ===== CHECKS =====

    /// Non-monotonic, duplicate, and missing timestamps
    ///
    /// Sorts and de-duplicates the dataset; in exact mode also reindexes it
    /// onto the expected grid.
    pub fn check_timestamp(&mut self, opts: &TimestampCheck) -> usize {
        self.diagnostics.info("Check timestamp");
        let outcome = self.ensure_data().and_then(|_| {
            let outcome = timestamp_masks(&self.data, opts)?;
            let intervals = self.extract_all(&outcome.flagged, opts.min_failures, true);
            Ok((outcome.data, intervals))
        });
        match outcome {
            Ok((data, intervals)) => {
                self.data = data;
                self.commit(intervals)
            }
            Err(err) => self.skip("check_timestamp", &err),
        }
    }

    /// Values outside the bounds
    pub fn check_range(&mut self, opts: &RangeCheck) -> usize {
        self.diagnostics.info("Check for data outside expected range");
        let outcome = self
            .setup(&opts.selector)
            .and_then(|data| range_masks(&data, &opts.bounds))
            .map(|flagged| self.extract_all(&flagged, opts.min_failures, false));
        self.finish("check_range", outcome)
    }

    /// Differences between values `increment` rows apart outside the bounds
    pub fn check_increment(&mut self, opts: &IncrementCheck) -> usize {
        self.diagnostics.info("Check for data increment outside expected range");
        let outcome = self
            .setup(&opts.selector)
            .and_then(|data| increment_masks(&data, opts))
            .map(|flagged| self.extract_all(&flagged, opts.min_failures, false));
        self.finish("check_increment", outcome)
    }

    /// Stagnant data and abrupt changes via rolling `max - min`
    pub fn check_delta(&mut self, opts: &DeltaCheck) -> usize {
        self.diagnostics
            .info("Check for stagnant data and/or abrupt changes using delta (max-min) within a rolling window");
        let outcome = self
            .setup(&opts.selector)
            .and_then(|data| delta_masks(&data, opts, self.time_filter.as_ref()))
            .map(|flagged| self.extract_all(&flagged, opts.min_failures, false));
        self.finish("check_delta", outcome)
    }

    /// Outliers by z-score, batch or streaming
    pub fn check_outlier(&mut self, opts: &OutlierCheck) -> usize {
        self.diagnostics.info("Check for outliers");
        if opts.streaming {
            let outcome = self.setup(&opts.selector).and_then(|data| {
                opts.bounds.validate()?;
                let window = opts.window.ok_or(QcError::InvalidWindow { seconds: 0.0 })?;
                let mut classifier = streaming_classifier(opts.bounds, opts.absolute_value);
                let out = run_streaming(&data, &mut classifier, window, Some(STREAMING_REBASE))?;
                Ok(self.extract_one(out.mask, opts.prefix(), opts.min_failures, false))
            });
            return self.finish("check_outlier", outcome);
        }
        let outcome = self
            .setup(&opts.selector)
            .and_then(|data| outlier_masks(&data, opts))
            .map(|flagged| self.extract_all(&flagged, opts.min_failures, false));
        self.finish("check_outlier", outcome)
    }

    /// Missing values
    ///
    /// Rows inside a reported missing-timestamp span, and cells already
    /// reported as missing data, are not reported again.
    pub fn check_missing(&mut self, opts: &MissingCheck) -> usize {
        self.diagnostics.info("Check for missing data");
        let outcome = self.setup(&opts.selector).map(|data| {
            let mut mask = missing_mask(&data);
            for interval in &self.results {
                if interval.error_flag == MISSING_TIMESTAMP {
                    for col in 0..mask.width() {
                        mask.fill_between(col, interval.start, interval.end, true);
                    }
                } else if interval.error_flag == MISSING_DATA {
                    if let Some(col) = mask.column_names().iter().position(|n| n == &interval.variable) {
                        mask.fill_between(col, interval.start, interval.end, true);
                    }
                }
            }
            self.extract_one(mask, MISSING_DATA, opts.min_failures, false)
        });
        self.finish("check_missing", outcome)
    }

    /// Sentinel values; failing cells are set to missing in the dataset
    pub fn check_corrupt(&mut self, opts: &CorruptCheck) -> usize {
        self.diagnostics.info("Check for corrupt data");
        let outcome = self.setup(&opts.selector).map(|data| {
            let mask = corrupt_mask(&data, &opts.corrupt_values);
            let intervals = self.extract_one(mask.clone(), crate::interval::CORRUPT_DATA, opts.min_failures, false);
            (mask, intervals)
        });
        match outcome {
            Ok((mask, intervals)) => {
                for (col, name) in mask.column_names().iter().enumerate() {
                    if let Some(values) = self.data.column_mut(name) {
                        for (v, &pass) in values.iter_mut().zip(mask.column(col)) {
                            if !pass {
                                *v = MISSING;
                            }
                        }
                    }
                }
                self.commit(intervals)
            }
            Err(err) => self.skip("check_corrupt", &err),
        }
    }

    /// Caller-supplied whole-dataset classifier
    ///
    /// Returns the classifier metadata, or `None` when the check was skipped.
    pub fn check_custom_static<C>(&mut self, opts: &CustomStaticCheck, classifier: &mut C) -> Option<Dataset>
    where
        C: StaticClassifier + ?Sized,
    {
        self.diagnostics.info("Check using a custom static function");
        let outcome = self.setup(&opts.selector).and_then(|data| {
            let out = run_static(&data, classifier)?;
            let intervals = self.extract_one(out.mask, &opts.error_message, opts.min_failures, false);
            Ok((out.metadata, intervals))
        });
        match outcome {
            Ok((metadata, intervals)) => {
                self.commit(intervals);
                Some(metadata)
            }
            Err(err) => {
                self.skip("check_custom_static", &err);
                None
            }
        }
    }

    /// Caller-supplied point classifier run in streaming mode
    ///
    /// Returns metadata and the rebase count, or `None` when skipped.
    pub fn check_custom_streaming<C>(
        &mut self,
        opts: &CustomStreamingCheck,
        classifier: &mut C,
    ) -> Option<StreamingReport>
    where
        C: PointClassifier + ?Sized,
    {
        self.diagnostics.info("Check using a custom streaming function");
        let outcome = self.setup(&opts.selector).and_then(|data| {
            let out = run_streaming(&data, classifier, opts.window, opts.rebase)?;
            let intervals = self.extract_one(out.mask, &opts.error_message, opts.min_failures, false);
            Ok((StreamingReport { metadata: out.metadata, rebase_count: out.rebase_count }, intervals))
        });
        match outcome {
            Ok((report, intervals)) => {
                self.commit(intervals);
                Some(report)
            }
            Err(err) => {
                self.skip("check_custom_streaming", &err);
                None
            }
        }
    }

    // ===== INTERNALS =====

    fn ensure_data(&self) -> QcResult<()> {
        if self.data.is_empty() {
            Err(QcError::EmptyDataset)
        } else {
            Ok(())
        }
    }

    fn setup(&self, selector: &Selector) -> QcResult<Dataset> {
        self.ensure_data()?;
        let columns = self.translations.resolve(selector, &self.data)?;
        self.data.select(&columns)
    }

    fn extract_one(&self, mut mask: Mask, label: &str, min_failures: usize, timestamp_test: bool) -> Vec<FailureInterval> {
        if let Some(filter) = &self.time_filter {
            filter.apply(&mut mask);
        }
        extract_intervals(&mask, label, min_failures, timestamp_test)
    }

    fn extract_all(&self, flagged: &[Flagged], min_failures: usize, timestamp_test: bool) -> Vec<FailureInterval> {
        flagged
            .iter()
            .flat_map(|f| self.extract_one(f.mask.clone(), &f.label, min_failures, timestamp_test))
            .collect()
    }

    fn finish(&mut self, check: &str, outcome: QcResult<Vec<FailureInterval>>) -> usize {
        match outcome {
            Ok(intervals) => self.commit(intervals),
            Err(err) => self.skip(check, &err),
        }
    }

    fn commit(&mut self, intervals: Vec<FailureInterval>) -> usize {
        let n = intervals.len();
        self.results.extend(intervals);
        n
    }

    fn skip(&mut self, check: &str, err: &QcError) -> usize {
        self.diagnostics.warn(&format!("{} skipped: {}", check, err));
        0
    }
}
