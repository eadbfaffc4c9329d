//! Basic Quality Control Example
//!
//! Runs the standard check sequence over a small two-sensor wave record and
//! prints the failure intervals and quality index.
//!
//! ## What You'll Learn
//!
//! - Loading a dataset and registering a translation key
//! - Running the timestamp check before the value checks
//! - Reading results, the mask, and the cleaned dataset
//!
//! ## Running the Example
//!
//! ```bash
//! RUST_LOG=qcguard=info cargo run --example 01_basic_qc
//! ```

use chrono::{Duration, NaiveDate};
use qcguard_core::{
    Bounds, CorruptCheck, Dataset, DeltaCheck, MissingCheck, QcEngine, QcResult, RangeCheck, Selector,
    TimestampCheck, MISSING,
};

fn build_dataset() -> QcResult<Dataset> {
    let t0 = NaiveDate::from_ymd_opt(2016, 10, 17)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start date");

    // 15-minute samples; 02:00 never arrived and 00:45 was logged twice
    let minutes = [0, 15, 30, 45, 45, 60, 75, 90, 105, 135, 150, 165];
    let index = minutes.iter().map(|&m| t0 + Duration::minutes(m)).collect();

    Dataset::from_columns(
        index,
        vec![
            ("Wave1", vec![0.51, 0.55, 0.61, 0.58, 0.58, 0.62, 0.66, 0.64, 0.60, 0.57, 0.55, 0.54]),
            ("Wave2", vec![0.48, 0.52, -999.0, 0.55, 0.55, 0.59, 7.5, 0.61, MISSING, 0.50, 0.50, 0.50]),
            ("Temp", vec![14.1, 14.1, 14.1, 14.1, 14.1, 14.1, 14.1, 14.1, 14.1, 14.1, 14.1, 14.1]),
        ],
    )
}

fn main() -> QcResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("QCGuard Basic QC Example");
    println!("========================\n");

    let mut engine = QcEngine::new();
    engine.add_dataset(build_dataset()?);
    engine.add_translation("Wave", ["Wave1", "Wave2"]);

    engine.check_timestamp(&TimestampCheck::new(900.0));
    engine.check_missing(&MissingCheck::new());
    engine.check_corrupt(&CorruptCheck::new(vec![-999.0]));
    engine.check_range(&RangeCheck::new(Bounds::between(0.0, 5.0)).selector(Selector::key("Wave")));
    engine.check_delta(&DeltaCheck::new(Bounds::lower(0.0001), 3600.0).selector(Selector::column("Temp")));

    println!("Failure intervals:");
    for r in engine.results() {
        let variable = if r.is_index_wide() { "*" } else { r.variable.as_str() };
        println!(
            "  {:<6} {} -> {} ({:>2} steps)  {}",
            variable, r.start, r.end, r.timesteps, r.error_flag
        );
    }

    println!("\nQuality index:");
    for (name, value) in engine.quality_index().iter() {
        println!("  {:<6} {:.3}", name, value);
    }

    let cleaned = engine.cleaned_data();
    let removed: usize = cleaned
        .columns()
        .iter()
        .map(|c| c.values.iter().filter(|v| v.is_nan()).count())
        .sum();
    println!("\n{} of {} cells missing after QC", removed, cleaned.len() * cleaned.width());

    Ok(())
}
