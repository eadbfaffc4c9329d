//! Custom Checks Example
//!
//! Plugs caller-defined classifiers into the engine: a static classifier
//! that sees the whole selected dataset at once, and a streaming
//! classifier that sees one point plus its history.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 03_custom_checks
//! ```

use chrono::{Duration, NaiveDate};
use qcguard_core::{
    CustomStaticCheck, CustomStreamingCheck, Dataset, History, LogSink, Mask, MemorySink, PointClassifier,
    PointVerdict, QcEngine, QcResult, Selector, StaticOutput, TeeSink,
};

/// Flags points that deviate from the history median by more than `limit`
struct MedianJump {
    limit: f64,
}

impl PointClassifier for MedianJump {
    fn classify(&mut self, point: &[f64], history: &History<'_>) -> PointVerdict {
        let mut verdict = PointVerdict::default();
        for (col, &x) in point.iter().enumerate() {
            let mut past: Vec<f64> = history.column(col).iter().copied().filter(|v| !v.is_nan()).collect();
            past.sort_by(f64::total_cmp);
            let median = if past.is_empty() { f64::NAN } else { past[past.len() / 2] };
            let jump = (x - median).abs();
            verdict.pass.push(jump.is_nan() || jump <= self.limit);
            verdict.metadata.push(median);
        }
        verdict
    }
}

fn main() -> QcResult<()> {
    env_logger::init();

    let t0 = NaiveDate::from_ymd_opt(2017, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start date");
    let index: Vec<_> = (0..12).map(|i| t0 + Duration::minutes(10 * i)).collect();
    let data = Dataset::from_columns(
        index,
        vec![
            ("Power", vec![5.0, 5.2, 5.1, 9.8, 5.3, 5.2, 5.1, 5.0, 0.2, 5.1, 5.2, 5.3]),
            ("Wind", vec![7.0, 7.5, 7.9, 8.1, 8.4, 8.0, 7.6, 7.8, 7.7, 7.5, 7.2, 7.0]),
        ],
    )?;

    let sink = MemorySink::new();
    let mut engine = QcEngine::with_diagnostics(TeeSink::new(LogSink, sink.clone()));
    engine.add_dataset(data);

    // Power should never exceed what the wind can deliver
    let mut power_curve = |d: &Dataset| {
        let mut mask = Mask::filled(d.index(), &d.column_names(), true);
        let mut ratio = Vec::with_capacity(d.len());
        if let (Some(col), Some(power), Some(wind)) = (d.position("Power"), d.column("Power"), d.column("Wind")) {
            for (row, (&p, &w)) in power.iter().zip(wind).enumerate() {
                let r = p / (0.02 * w.powi(3));
                mask.set(row, col, r <= 1.0);
                ratio.push(r);
            }
        }
        let metadata = Dataset::from_columns(d.index().to_vec(), vec![("PowerRatio", ratio)]).expect("ratio matches index");
        StaticOutput { mask, metadata }
    };
    let static_opts = CustomStaticCheck::new("Power above curve").selector(Selector::All);
    engine.check_custom_static(&static_opts, &mut power_curve);

    let streaming_opts = CustomStreamingCheck::new(1800.0)
        .selector(Selector::column("Power"))
        .error_message("Median jump");
    if let Some(report) = engine.check_custom_streaming(&streaming_opts, &mut MedianJump { limit: 2.0 }) {
        println!("Streaming metadata rows: {}", report.metadata.len());
        println!("Rebased cells: {}", report.rebase_count);
    }

    for r in engine.results() {
        println!("{:<6} {} -> {}  {}", r.variable, r.start, r.end, r.error_flag);
    }
    println!("{} diagnostic warning(s)", sink.warnings().len());

    Ok(())
}
