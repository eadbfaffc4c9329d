//! QC plan model and application

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use qcguard_core::diagnostics::LOG_TARGET;
use qcguard_core::time::{duration_from_secs, frequency_from_secs};
use qcguard_core::{
    qci, ColumnSeries, CorruptCheck, Dataset, DeltaCheck, DiagnosticSink, IncrementCheck, LogSink, MemorySink,
    MissingCheck, OutlierCheck, QcEngine, QcError, RangeCheck, TeeSink, TimeFilter, TimestampCheck,
};
use serde::{Deserialize, Serialize};

use crate::summary::RunSummary;
use crate::{ConfigError, ConfigResult};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One value check in a plan, tagged by `"type"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckSpec {
    /// Values outside bounds
    Range(RangeCheck),
    /// Differences between rows outside bounds
    Increment(IncrementCheck),
    /// Rolling max - min outside bounds
    Delta(DeltaCheck),
    /// Z-scores outside bounds
    Outlier(OutlierCheck),
    /// Missing values
    Missing(MissingCheck),
    /// Sentinel values
    Corrupt(CorruptCheck),
}

impl CheckSpec {
    /// Type tag used in the plan file
    pub fn kind(&self) -> &'static str {
        match self {
            CheckSpec::Range(_) => "range",
            CheckSpec::Increment(_) => "increment",
            CheckSpec::Delta(_) => "delta",
            CheckSpec::Outlier(_) => "outlier",
            CheckSpec::Missing(_) => "missing",
            CheckSpec::Corrupt(_) => "corrupt",
        }
    }

    /// Check the options without running anything
    pub fn validate(&self) -> Result<(), QcError> {
        match self {
            CheckSpec::Range(c) => c.bounds.validate(),
            CheckSpec::Increment(c) => {
                c.bounds.validate()?;
                if c.increment == 0 {
                    return Err(QcError::InvalidIncrement { increment: 0 });
                }
                Ok(())
            }
            CheckSpec::Delta(c) => {
                c.bounds.validate()?;
                duration_from_secs(c.window).map(|_| ())
            }
            CheckSpec::Outlier(c) => {
                c.bounds.validate()?;
                match c.window {
                    Some(w) => duration_from_secs(w).map(|_| ()),
                    None if c.streaming => Err(QcError::InvalidWindow { seconds: 0.0 }),
                    None => Ok(()),
                }
            }
            CheckSpec::Missing(_) | CheckSpec::Corrupt(_) => Ok(()),
        }
    }

    /// Run on `engine`, returning the number of intervals appended
    pub fn run<S: DiagnosticSink>(&self, engine: &mut QcEngine<S>) -> usize {
        match self {
            CheckSpec::Range(c) => engine.check_range(c),
            CheckSpec::Increment(c) => engine.check_increment(c),
            CheckSpec::Delta(c) => engine.check_delta(c),
            CheckSpec::Outlier(c) => engine.check_outlier(c),
            CheckSpec::Missing(c) => engine.check_missing(c),
            CheckSpec::Corrupt(c) => engine.check_corrupt(c),
        }
    }
}

/// Evaluate only timestamps whose clock time lies strictly between `after`
/// and `before` seconds past midnight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockWindow {
    /// Lower clock-time limit in seconds
    pub after: f64,
    /// Upper clock-time limit in seconds
    pub before: f64,
}

impl ClockWindow {
    /// Filter over `index`
    pub fn filter(&self, index: &[qcguard_core::Timestamp]) -> TimeFilter {
        TimeFilter::clock_window(index, self.after, self.before)
    }
}

/// A complete, serializable QC run description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QcPlan {
    /// Translation keys to register before any check
    #[serde(default)]
    pub translations: BTreeMap<String, Vec<String>>,
    /// Timestamp check, run first when present
    #[serde(default)]
    pub timestamp: Option<TimestampCheck>,
    /// Clock-time filter, built after the timestamp check
    #[serde(default)]
    pub time_filter: Option<ClockWindow>,
    /// Value checks in run order
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    /// Columns reported in the quality index (all when absent)
    #[serde(default)]
    pub qci_columns: Option<Vec<String>>,
}

/// What applying a plan did
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    /// Checks executed, including the timestamp check
    pub checks_run: usize,
    /// Intervals appended across all checks
    pub intervals_appended: usize,
    /// Quality index over the reported columns
    pub quality_index: ColumnSeries,
}

impl QcPlan {
    /// Parse and validate a plan from JSON text
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let plan: QcPlan = serde_json::from_str(text)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Read, parse, and validate a plan file
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let plan = Self::from_json_str(&text)?;
        debug!(target: LOG_TARGET, "loaded plan from {} ({} checks)", path.display(), plan.checks.len());
        Ok(plan)
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject plans whose options would make a check skip
    ///
    /// Translation targets and selected columns are not checked here; they
    /// depend on the dataset and are resolved when the plan is applied.
    pub fn validate(&self) -> ConfigResult<()> {
        for (key, columns) in &self.translations {
            if columns.is_empty() {
                return Err(ConfigError::InvalidPlan(format!("translation '{}' has no columns", key)));
            }
        }
        if let Some(ts) = &self.timestamp {
            frequency_from_secs(ts.frequency)
                .map_err(|source| ConfigError::Check { index: 0, kind: "timestamp", source })?;
        }
        if let Some(w) = &self.time_filter {
            let in_day = |s: f64| (0.0..=SECONDS_PER_DAY).contains(&s);
            if !(in_day(w.after) && in_day(w.before) && w.after < w.before) {
                return Err(ConfigError::InvalidPlan(format!(
                    "time filter window ({}, {}) must satisfy 0 <= after < before <= {}",
                    w.after, w.before, SECONDS_PER_DAY
                )));
            }
        }
        for (index, check) in self.checks.iter().enumerate() {
            check.validate().map_err(|source| ConfigError::Check { index, kind: check.kind(), source })?;
        }
        Ok(())
    }

    /// Run the plan against `engine`
    ///
    /// Order: translations, timestamp check, time filter, value checks,
    /// quality index. Unknown `qci_columns` are left out with a warning on the
    /// engine's diagnostics sink.
    pub fn apply<S: DiagnosticSink>(&self, engine: &mut QcEngine<S>) -> PlanOutcome {
        engine.add_translations(self.translations.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut checks_run = 0;
        let mut intervals_appended = 0;
        if let Some(ts) = &self.timestamp {
            intervals_appended += engine.check_timestamp(ts);
            checks_run += 1;
        }
        if let Some(window) = &self.time_filter {
            let filter = window.filter(engine.data().index());
            engine.add_time_filter(filter);
        }
        for check in &self.checks {
            intervals_appended += check.run(engine);
            checks_run += 1;
        }

        PlanOutcome { checks_run, intervals_appended, quality_index: self.quality_index(engine) }
    }

    /// Load `data` into a fresh engine, apply the plan, and summarize
    ///
    /// Diagnostics go to the `log` facade and are also kept as the summary's
    /// warnings.
    pub fn run(&self, data: Dataset) -> RunSummary {
        let memory = MemorySink::new();
        let mut engine = QcEngine::with_diagnostics(TeeSink::new(LogSink, memory.clone()));
        engine.add_dataset(data);
        let outcome = self.apply(&mut engine);
        RunSummary::from_engine(&engine)
            .with_quality_index(outcome.quality_index)
            .with_warnings(memory.warnings())
    }

    fn quality_index<S: DiagnosticSink>(&self, engine: &mut QcEngine<S>) -> ColumnSeries {
        let all = qci(&engine.mask(), engine.time_filter());
        let Some(wanted) = &self.qci_columns else {
            return all;
        };
        let mut names = Vec::with_capacity(wanted.len());
        let mut values = Vec::with_capacity(wanted.len());
        for name in wanted {
            match all.get(name) {
                Some(v) => {
                    names.push(name.clone());
                    values.push(v);
                }
                None => engine.diagnostics_mut().warn(&format!("qci column '{}' not in dataset", name)),
            }
        }
        ColumnSeries::new(names, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcguard_core::{Bounds, Selector};

    #[test]
    fn check_specs_parse_with_defaults() {
        let plan = QcPlan::from_json_str(
            r#"{
                "checks": [
                    { "type": "missing" },
                    { "type": "range", "bounds": { "upper": 5 }, "selector": { "key": "Wave" } },
                    { "type": "delta", "bounds": { "lower": 0.0001 }, "window": 3600, "direction": "positive" },
                    { "type": "outlier", "bounds": { "lower": -3, "upper": 3 }, "window": 7200, "streaming": true }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(plan.checks.len(), 4);
        assert_eq!(plan.checks[0], CheckSpec::Missing(MissingCheck::new()));
        let range = RangeCheck::new(Bounds::upper(5.0)).selector(Selector::key("Wave"));
        assert_eq!(plan.checks[1], CheckSpec::Range(range));
        match &plan.checks[2] {
            CheckSpec::Delta(d) => {
                assert_eq!(d.window, 3600.0);
                assert_eq!(d.min_failures, 1);
                assert_eq!(d.selector, Selector::All);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(plan.checks[3].kind(), "outlier");
    }

    #[test]
    fn unknown_check_type_is_json_error() {
        let err = QcPlan::from_json_str(r#"{ "checks": [ { "type": "spline" } ] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn validation_names_bad_check() {
        let err = QcPlan::from_json_str(
            r#"{ "checks": [ { "type": "missing" }, { "type": "delta", "bounds": { "upper": 1 }, "window": -60 } ] }"#,
        )
        .unwrap_err();
        match err {
            ConfigError::Check { index, kind, .. } => assert_eq!((index, kind), (1, "delta")),
            other => panic!("unexpected {:?}", other),
        }

        let streaming_without_window =
            QcPlan::from_json_str(r#"{ "checks": [ { "type": "outlier", "bounds": { "upper": 3 }, "streaming": true } ] }"#);
        assert!(matches!(streaming_without_window, Err(ConfigError::Check { index: 0, .. })));
    }

    #[test]
    fn validation_rejects_bad_plan_options() {
        let filter = QcPlan::from_json_str(r#"{ "time_filter": { "after": 7200, "before": 3600 } }"#);
        assert!(matches!(filter, Err(ConfigError::InvalidPlan(_))));

        let translation = QcPlan::from_json_str(r#"{ "translations": { "Wave": [] } }"#);
        assert!(matches!(translation, Err(ConfigError::InvalidPlan(_))));

        let ts = QcPlan::from_json_str(r#"{ "timestamp": { "frequency": 0 } }"#);
        assert!(matches!(ts, Err(ConfigError::Check { kind: "timestamp", .. })));
    }

    #[test]
    fn zero_increment_is_rejected_as_increment() {
        let err = QcPlan::from_json_str(r#"{ "checks": [ { "type": "increment", "bounds": { "upper": 1 }, "increment": 0 } ] }"#)
            .unwrap_err();
        match err {
            ConfigError::Check { index, kind, source } => {
                assert_eq!((index, kind), (0, "increment"));
                assert_eq!(source, QcError::InvalidIncrement { increment: 0 });
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_qci_column_warns_through_engine_sink() {
        let plan = QcPlan { qci_columns: Some(vec!["A".into(), "Nope".into()]), ..QcPlan::default() };
        let t0 = chrono::NaiveDate::from_ymd_opt(2017, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let index = (0..3).map(|i| t0 + chrono::Duration::hours(i)).collect();
        let sink = MemorySink::new();
        let mut engine = QcEngine::with_diagnostics(sink.clone());
        engine.add_dataset(Dataset::from_columns(index, vec![("A", vec![1.0, 2.0, 3.0])]).unwrap());

        let outcome = plan.apply(&mut engine);
        assert_eq!(outcome.quality_index.names(), &["A".to_string()]);
        assert_eq!(sink.warnings(), vec!["qci column 'Nope' not in dataset".to_string()]);
    }

    #[test]
    fn plan_survives_json() {
        let plan = QcPlan {
            checks: vec![CheckSpec::Corrupt(CorruptCheck::new(vec![-999.0]))],
            qci_columns: Some(vec!["A".into()]),
            ..QcPlan::default()
        };
        let text = plan.to_json_pretty().unwrap();
        assert!(text.contains("\"type\": \"corrupt\""));
        assert_eq!(QcPlan::from_json_str(&text).unwrap(), plan);
    }
}
