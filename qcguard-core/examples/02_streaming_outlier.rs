//! Streaming Outlier Example
//!
//! Compares whole-series and streaming outlier detection on an hourly
//! record. The streaming check scores every point against the preceding
//! window only, with points that already failed removed from history.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_streaming_outlier
//! ```

use chrono::{Duration, NaiveDate};
use qcguard_core::functional;
use qcguard_core::{Bounds, Dataset, OutlierCheck, QcResult, MISSING};

fn main() -> QcResult<()> {
    env_logger::init();

    let t0 = NaiveDate::from_ymd_opt(2017, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start date");
    let values = vec![
        112.0, 114.0, 113.0, 132.0, 134.0, 127.0, 150.0, 120.0, 117.0, 112.0, 107.0, 99.0, 140.0, 98.0, 88.0, 98.0,
        106.0, 110.0, 107.0, 79.0, 102.0, 115.0, MISSING, 91.0,
    ];
    let index = (0..values.len() as i64).map(|h| t0 + Duration::hours(h)).collect();
    let data = Dataset::from_columns(index, vec![("Flow", values)])?;

    let bounds = Bounds::between(-2.0, 2.0);

    let batch = functional::check_outlier(data.clone(), &OutlierCheck::new(bounds));
    println!("Whole-series z-score: {} interval(s)", batch.results.len());
    for r in &batch.results {
        println!("  {} -> {}  {}", r.start, r.end, r.error_flag);
    }

    let window = 6.0 * 3600.0;
    let streaming = functional::check_outlier(data.clone(), &OutlierCheck::new(bounds).window(window).streaming(true));
    println!("\nStreaming z-score (6 h window): {} interval(s)", streaming.results.len());
    for r in &streaming.results {
        println!("  {} -> {} ({} steps)", r.start, r.end, r.timesteps);
    }

    let rolling = functional::check_outlier(data, &OutlierCheck::new(bounds).window(window));
    println!("\nRolling z-score (6 h window): {} interval(s)", rolling.results.len());

    Ok(())
}
