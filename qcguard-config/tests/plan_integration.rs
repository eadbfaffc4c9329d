//! Plan files applied end to end

use std::io::Write;

use chrono::{Duration, NaiveDate};
use qcguard_config::{ConfigError, QcPlan, RunSummary};
use qcguard_core::interval::{DUPLICATE_TIMESTAMP, MISSING_TIMESTAMP};
use qcguard_core::{Dataset, MemorySink, QcEngine, MISSING};

const PLAN: &str = r#"{
    "translations": { "Wave": ["Wave1", "Wave2"] },
    "timestamp": { "frequency": 900 },
    "checks": [
        { "type": "missing" },
        { "type": "corrupt", "corrupt_values": [-999] },
        { "type": "range", "bounds": { "lower": 0, "upper": 5 }, "selector": { "key": "Wave" } }
    ],
    "qci_columns": ["Wave2", "Nope"]
}"#;

fn wave_dataset() -> Dataset {
    let t0 = NaiveDate::from_ymd_opt(2016, 10, 17).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let minutes = [0, 15, 30, 30, 45, 75, 90];
    let index = minutes.iter().map(|&m| t0 + Duration::minutes(m)).collect();
    Dataset::from_columns(
        index,
        vec![
            ("Wave1", vec![0.5, 0.6, 0.7, 0.8, 0.6, 0.5, 0.4]),
            ("Wave2", vec![0.4, -999.0, 0.6, 0.6, 12.0, MISSING, 0.5]),
        ],
    )
    .unwrap()
}

fn plan_file(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn plan_from_file_applies_in_order() {
    let file = plan_file(PLAN);
    let plan = QcPlan::from_path(file.path()).unwrap();

    let sink = MemorySink::new();
    let mut engine = QcEngine::with_diagnostics(sink.clone());
    engine.add_dataset(wave_dataset());
    let outcome = plan.apply(&mut engine);

    assert_eq!(outcome.checks_run, 4);
    // duplicate + missing timestamp, missing data, corrupt, range
    assert_eq!(outcome.intervals_appended, 5);
    let flags: Vec<_> = engine.results().iter().map(|r| r.error_flag.as_str()).collect();
    assert_eq!(flags[..2], [DUPLICATE_TIMESTAMP, MISSING_TIMESTAMP]);

    assert_eq!(outcome.quality_index.names(), &["Wave2".to_string()]);
    assert!((outcome.quality_index.values()[0] - 3.0 / 7.0).abs() < 1e-12);
    assert_eq!(sink.warnings(), vec!["qci column 'Nope' not in dataset".to_string()]);
}

#[test]
fn run_writes_summary() {
    let plan = QcPlan::from_json_str(PLAN).unwrap();
    let summary = plan.run(wave_dataset());

    assert_eq!(summary.rows, 7);
    assert_eq!(summary.results.len(), 5);
    assert_eq!(summary.warnings, vec!["qci column 'Nope' not in dataset".to_string()]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.json");
    summary.write_to(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(RunSummary::from_json_str(&text).unwrap(), summary);
}

#[test]
fn time_filter_is_built_after_reindexing() {
    let plan = QcPlan::from_json_str(
        r#"{
            "timestamp": { "frequency": 900 },
            "time_filter": { "after": 0, "before": 3000 },
            "checks": [ { "type": "missing" } ]
        }"#,
    )
    .unwrap();
    let summary = plan.run(wave_dataset());

    // Wave2 is missing at 01:15, outside the filter
    assert_eq!(summary.results.len(), 2);
    assert!(summary.results.iter().all(|r| r.is_index_wide()));
}

#[test]
fn skipped_checks_surface_as_warnings() {
    let plan = QcPlan::from_json_str(r#"{ "checks": [ { "type": "range", "bounds": { "upper": 1 }, "selector": { "key": "Wind" } } ] }"#)
        .unwrap();
    let summary = plan.run(wave_dataset());

    assert!(summary.results.is_empty());
    assert_eq!(summary.warnings, vec!["check_range skipped: Undefined translation key 'Wind'".to_string()]);
}

#[test]
fn missing_plan_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = QcPlan::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
