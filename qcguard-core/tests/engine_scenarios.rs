//! End-to-end scenarios for the QC engine
//!
//! Each test loads a reference dataset, runs one or more checks, and asserts
//! exact interval boundaries, the derived mask, and the quality index.

mod common;

use common::scenarios::{delta_dataset, outlier_dataset, wave_dataset};
use common::{frame, hour, hourly, midnight, regular_index, span, total_timesteps};
use qcguard_core::interval::{DUPLICATE_TIMESTAMP, MISSING_DATA, MISSING_TIMESTAMP};
use qcguard_core::{
    Bounds, CorruptCheck, DeltaCheck, Direction, IncrementCheck, MemorySink, MissingCheck, OutlierCheck, QcEngine,
    RangeCheck, Selector, TimeFilter, TimestampCheck,
};

fn engine_with(data: qcguard_core::Dataset) -> (QcEngine<MemorySink>, MemorySink) {
    let sink = MemorySink::new();
    let mut engine = QcEngine::with_diagnostics(sink.clone());
    engine.add_dataset(data);
    (engine, sink)
}

// ===== DELTA =====

#[test]
fn abrupt_change_without_direction() {
    let (mut engine, sink) = engine_with(delta_dataset());
    let n = engine.check_delta(&DeltaCheck::new(Bounds::upper(7.0), 3.0 * 3600.0));

    assert_eq!(n, 3);
    let spans: Vec<_> = engine.results().iter().map(span).collect();
    assert_eq!(
        spans,
        vec![("A", hour(13), hour(16), 4), ("B", hour(10), hour(12), 3), ("B", hour(16), hour(19), 4)]
    );
    assert!(engine.results().iter().all(|r| r.error_flag == "Delta > upper bound, 7"));
    assert!(sink.warnings().is_empty());
}

#[test]
fn abrupt_change_positive_direction() {
    let (mut engine, _) = engine_with(delta_dataset());
    let opts = DeltaCheck::new(Bounds::upper(7.0), 3.0 * 3600.0).direction(Direction::Positive);
    engine.check_delta(&opts);

    let spans: Vec<_> = engine.results().iter().map(span).collect();
    assert_eq!(spans, vec![("A", hour(13), hour(16), 4), ("B", hour(16), hour(19), 4)]);
    assert_eq!(engine.results()[0].error_flag, "Delta (+) > upper bound, 7");
}

#[test]
fn abrupt_change_negative_direction() {
    let (mut engine, _) = engine_with(delta_dataset());
    let opts = DeltaCheck::new(Bounds::upper(7.0), 3.0 * 3600.0).direction(Direction::Negative);
    engine.check_delta(&opts);

    let spans: Vec<_> = engine.results().iter().map(span).collect();
    assert_eq!(spans, vec![("B", hour(10), hour(12), 3)]);
    assert_eq!(engine.results()[0].error_flag, "Delta (-) > upper bound, 7");
}

#[test]
fn dead_sensor() {
    let (mut engine, _) = engine_with(delta_dataset());
    engine.check_delta(&DeltaCheck::new(Bounds::lower(1.0), 5.0 * 3600.0));

    let spans: Vec<_> = engine.results().iter().map(span).collect();
    assert_eq!(spans, vec![("A", hour(1), hour(8), 8), ("A", hour(16), hour(23), 8)]);
    assert_eq!(engine.results()[0].error_flag, "Delta < lower bound, 1");
}

#[test]
fn stagnant_short_series() {
    let index = regular_index(midnight(2016, 10, 17), 3, 900);
    let (mut engine, _) = engine_with(frame(index.clone(), vec![("A", vec![0.5, 0.5, 0.5])]));
    engine.check_delta(&DeltaCheck::new(Bounds::lower(0.0001), 3600.0));

    assert_eq!(engine.results().len(), 1);
    assert_eq!(span(&engine.results()[0]), ("A", index[0], index[2], 3));
}

#[test]
fn upper_bound_spans_min_to_max() {
    let (mut engine, _) = engine_with(frame(hourly(4), vec![("A", vec![0.0, 0.0, 10.0, 0.0])]));
    engine.check_delta(&DeltaCheck::new(Bounds::upper(5.0), 7200.0));

    assert_eq!(engine.results().len(), 1);
    assert_eq!(span(&engine.results()[0]), ("A", hour(1), hour(2), 2));
}

// ===== INCREMENT =====

#[test]
fn increment_over_five_rows() {
    let (mut engine, _) = engine_with(delta_dataset());
    let opts = IncrementCheck::new(Bounds::lower(1.0)).increment(5).selector(Selector::column("A"));
    engine.check_increment(&opts);

    assert_eq!(total_timesteps(engine.results()), 10);
    let starts: Vec<_> = engine.results().iter().map(|r| r.start).collect();
    assert_eq!(starts, vec![hour(5), hour(10), hour(21)]);
    assert!(engine.results().iter().all(|r| r.error_flag == "|Increment| < lower bound, 1"));
}

#[test]
fn increment_single_spike() {
    let (mut engine, _) = engine_with(frame(hourly(4), vec![("A", vec![0.0, 0.0, 10.0, 0.0])]));
    engine.check_increment(&IncrementCheck::new(Bounds::upper(5.0)));

    assert_eq!(engine.results().len(), 1);
    assert_eq!(span(&engine.results()[0]), ("A", hour(2), hour(3), 2));
}

// ===== OUTLIER =====

#[test]
fn outlier_whole_series() {
    let (mut engine, _) = engine_with(outlier_dataset());
    engine.check_outlier(&OutlierCheck::new(Bounds::between(-1.9, 1.9)));

    let results = engine.results();
    assert_eq!(results.len(), 2);
    assert_eq!((results[0].start, results[0].error_flag.as_str()), (hour(19), "Outlier < lower bound, -1.9"));
    assert_eq!((results[1].start, results[1].error_flag.as_str()), (hour(6), "Outlier > upper bound, 1.9"));
}

#[test]
fn outlier_absolute_value() {
    let (mut engine, _) = engine_with(outlier_dataset());
    engine.check_outlier(&OutlierCheck::new(Bounds::upper(1.9)).absolute_value(true));

    let starts: Vec<_> = engine.results().iter().map(|r| r.start).collect();
    assert_eq!(starts, vec![hour(6), hour(19)]);
    assert_eq!(engine.results()[0].error_flag, "|Outlier| > upper bound, 1.9");
}

#[test]
fn outlier_streaming_with_rebase() {
    let (mut engine, sink) = engine_with(outlier_dataset());
    let opts = OutlierCheck::new(Bounds::between(-2.0, 2.0)).window(6.0 * 3600.0).streaming(true);
    engine.check_outlier(&opts);

    assert!(sink.warnings().is_empty());
    let mask = engine.mask();
    let failed: Vec<usize> = (0..mask.rows()).filter(|&r| !mask.get(r, 0)).collect();
    assert_eq!(failed, vec![6, 11, 12, 13, 14, 19, 21, 23]);
    assert!(engine.results().iter().all(|r| r.error_flag == "Outlier"));
}

// ===== FULL PIPELINE =====

#[test]
fn wave_pipeline() {
    let (mut engine, sink) = engine_with(wave_dataset());
    engine.add_translation("Wave", ["Wave1", "Wave2"]);

    // duplicate 00:30 and absent 01:00
    assert_eq!(engine.check_timestamp(&TimestampCheck::new(900.0)), 2);
    assert_eq!(engine.data().len(), 7);
    let flags: Vec<_> = engine.results().iter().map(|r| r.error_flag.as_str()).collect();
    assert_eq!(flags, vec![DUPLICATE_TIMESTAMP, MISSING_TIMESTAMP]);
    assert!(engine.results().iter().all(|r| r.is_index_wide()));

    // 01:00 is covered by the missing timestamp, only Wave2 at 01:15 remains
    assert_eq!(engine.check_missing(&MissingCheck::new()), 1);
    let missing = engine.results().last().unwrap();
    assert_eq!((missing.variable.as_str(), missing.error_flag.as_str()), ("Wave2", MISSING_DATA));

    assert_eq!(engine.check_corrupt(&CorruptCheck::new(vec![-999.0])), 1);
    assert!(engine.data().column("Wave2").unwrap()[1].is_nan());

    let range = RangeCheck::new(Bounds::between(0.0, 5.0)).selector(Selector::key("Wave"));
    assert_eq!(engine.check_range(&range), 1);
    assert_eq!(engine.results().last().unwrap().error_flag, "Data > upper bound, 5");

    let mask = engine.mask();
    assert_eq!(mask.column_by_name("Wave1").unwrap(), &[true, true, true, true, false, true, true]);
    assert_eq!(mask.column_by_name("Wave2").unwrap(), &[true, false, true, false, false, false, true]);

    let q = engine.quality_index();
    assert!((q.get("Wave1").unwrap() - 6.0 / 7.0).abs() < 1e-12);
    assert!((q.mean() - 9.0 / 14.0).abs() < 1e-12);
    assert!(sink.warnings().is_empty());
}

#[test]
fn time_filter_limits_evaluation() {
    let (mut engine, _) = engine_with(delta_dataset());
    let index = engine.data().index().to_vec();
    // evaluate 12:00 to 18:00 only
    engine.add_time_filter(TimeFilter::clock_window(&index, 11.5 * 3600.0, 18.5 * 3600.0));
    engine.check_range(&RangeCheck::new(Bounds::upper(5.5)).selector(Selector::column("A")));

    let spans: Vec<_> = engine.results().iter().map(span).collect();
    assert_eq!(spans, vec![("A", hour(15), hour(18), 4)]);

    let q = engine.quality_index();
    assert!((q.get("A").unwrap() - 3.0 / 7.0).abs() < 1e-12);
}

#[test]
fn misconfigured_checks_leave_results_untouched() {
    let (mut engine, sink) = engine_with(delta_dataset());
    engine.check_range(&RangeCheck::new(Bounds::upper(1.0)).selector(Selector::column("A")));
    let before = engine.results().to_vec();

    assert_eq!(engine.check_delta(&DeltaCheck::new(Bounds::upper(1.0), -5.0)), 0);
    assert_eq!(engine.check_range(&RangeCheck::new(Bounds::upper(f64::NAN))), 0);
    assert_eq!(engine.check_missing(&MissingCheck::new().selector(Selector::key("Nope"))), 0);

    assert_eq!(engine.results(), before.as_slice());
    assert_eq!(sink.warnings().len(), 3);
}

// ===== EDGE CASES =====

#[test]
fn single_row_dataset() {
    let (mut engine, sink) = engine_with(frame(hourly(1), vec![("A", vec![9.0])]));

    assert_eq!(engine.check_timestamp(&TimestampCheck::new(900.0)), 0);
    assert_eq!(engine.data().len(), 1);

    assert_eq!(engine.check_range(&RangeCheck::new(Bounds::upper(5.0)).min_failures(2)), 0);
    assert_eq!(engine.quality_index().get("A"), Some(1.0));

    // one value never fills a rolling window or has a predecessor
    assert_eq!(engine.check_delta(&DeltaCheck::new(Bounds::between(0.0001, 7.0), 3600.0)), 0);
    assert_eq!(engine.check_increment(&IncrementCheck::new(Bounds::upper(1.0))), 0);

    assert_eq!(engine.check_range(&RangeCheck::new(Bounds::upper(5.0))), 1);
    assert_eq!(span(&engine.results()[0]), ("A", hour(0), hour(0), 1));
    assert_eq!(engine.results()[0].error_flag, "Data > upper bound, 5");
    assert_eq!(engine.quality_index().get("A"), Some(0.0));
    assert!(sink.warnings().is_empty());
}

#[test]
fn tolerant_timestamps_with_expected_range_beyond_data() {
    let day = midnight(2016, 10, 17);
    let at = |h: i64, m: i64| day + chrono::Duration::minutes(60 * h + m);
    // 06:10 lies past the expected end and is ignored by the bins
    let index = vec![at(1, 5), at(3, 3), at(3, 50), at(6, 10)];
    let (mut engine, sink) = engine_with(frame(index, vec![("A", vec![1.0, 2.0, 3.0, 4.0])]));

    let opts = TimestampCheck::new(3600.0).exact_times(false).expected_start(day).expected_end(at(5, 0));
    assert_eq!(engine.check_timestamp(&opts), 3);

    let spans: Vec<_> = engine.results().iter().map(span).collect();
    assert_eq!(spans, vec![("", at(0, 0), at(0, 0), 1), ("", at(2, 0), at(2, 0), 1), ("", at(4, 0), at(5, 0), 2)]);
    assert!(engine.results().iter().all(|r| r.error_flag == MISSING_TIMESTAMP && r.is_index_wide()));

    // tolerant mode keeps the observed rows as they are
    assert_eq!(engine.data().len(), 4);
    // every empty bin falls between observed rows, so no cell fails
    assert!(engine.mask().all_pass());
    assert_eq!(engine.quality_index().get("A"), Some(1.0));
    assert!(sink.warnings().is_empty());
}
