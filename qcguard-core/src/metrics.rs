//! Quality metrics
//!
//! ## Overview
//!
//! The quality index (QCI) reduces a mask to one number per column: the
//! fraction of evaluated timestamps that passed every check.
//!
//! ```text
//! QCI(col) = passed(col) / |T|        T = timestamps included by the filter
//! ```
//!
//! The module also carries the general-purpose metrics QC reports lean on:
//! RMSE between two frames, trapezoidal time integrals, time derivatives,
//! and detection statistics for scoring a mask against known anomalies.
//!
//! All functions take an optional [`TimeFilter`]; excluded timestamps are
//! dropped before the metric is computed.

use serde::{Deserialize, Serialize};

use crate::dataset::{is_missing, Dataset};
use crate::errors::{QcError, QcResult};
use crate::filter::TimeFilter;
use crate::mask::Mask;
use crate::time::datetime_to_elapsedtime;

/// One value per named column
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnSeries {
    names: Vec<String>,
    values: Vec<f64>,
}

impl ColumnSeries {
    /// Series from parallel names and values
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        Self { names, values }
    }

    /// Value for `name`
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names.iter().position(|n| n == name).map(|i| self.values[i])
    }

    /// Mean over all columns (NaN when empty)
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no column is present
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values in column order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }
}

fn keep_rows(index: &[crate::time::Timestamp], filter: Option<&TimeFilter>) -> Vec<bool> {
    match filter {
        Some(f) => f.flags_for(index),
        None => vec![true; index.len()],
    }
}

fn same_columns(left: Vec<String>, right: Vec<String>) -> QcResult<()> {
    let mut l = left.clone();
    let mut r = right.clone();
    l.sort();
    r.sort();
    if l != r {
        return Err(QcError::ColumnMismatch { left, right });
    }
    Ok(())
}

/// Quality index per column
///
/// A filter that excludes every timestamp gives NaN.
pub fn qci(mask: &Mask, filter: Option<&TimeFilter>) -> ColumnSeries {
    let keep = keep_rows(mask.index(), filter);
    let total = keep.iter().filter(|&&k| k).count();
    let values = (0..mask.width())
        .map(|col| {
            let passed = mask.column(col).iter().zip(&keep).filter(|(&p, &k)| p && k).count();
            passed as f64 / total as f64
        })
        .collect();
    ColumnSeries::new(mask.column_names().to_vec(), values)
}

/// Root mean squared error per column, skipping missing pairs
pub fn rmse(a: &Dataset, b: &Dataset, filter: Option<&TimeFilter>) -> QcResult<ColumnSeries> {
    same_columns(a.column_names(), b.column_names())?;
    if a.len() != b.len() {
        return Err(QcError::LengthMismatch { what: "rmse inputs", expected: a.len(), actual: b.len() });
    }
    let keep = keep_rows(a.index(), filter);
    let names = a.column_names();
    let mut values = Vec::with_capacity(names.len());
    for name in &names {
        let (x, y) = match (a.column(name), b.column(name)) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(QcError::UndefinedColumn { column: name.clone() }),
        };
        let (n, ss) = x
            .iter()
            .zip(y)
            .zip(&keep)
            .filter(|(_, &k)| k)
            .map(|((p, q), _)| p - q)
            .filter(|d| !is_missing(*d))
            .fold((0usize, 0.0), |(n, s), d| (n + 1, s + d * d));
        values.push((ss / n as f64).sqrt());
    }
    Ok(ColumnSeries::new(names, values))
}

/// Trapezoidal integral over time, in value-seconds; missing values count as 0
pub fn time_integral(data: &Dataset, filter: Option<&TimeFilter>) -> ColumnSeries {
    let data = match filter {
        Some(f) => data.filter_rows(&f.flags_for(data.index())),
        None => data.clone(),
    };
    let t = datetime_to_elapsedtime(data.index(), 0.0);
    let values = data
        .columns()
        .iter()
        .map(|c| {
            let y: Vec<f64> = c.values.iter().map(|&v| if is_missing(v) { 0.0 } else { v }).collect();
            (1..y.len()).map(|i| 0.5 * (y[i] + y[i - 1]) * (t[i] - t[i - 1])).sum()
        })
        .collect();
    ColumnSeries::new(data.column_names(), values)
}

/// Time derivative of every column, in value per second
///
/// Second-order central differences on the possibly uneven spacing for
/// interior rows and one-sided first differences at the ends. Needs at least
/// two rows.
pub fn time_derivative(data: &Dataset, filter: Option<&TimeFilter>) -> QcResult<Dataset> {
    let data = match filter {
        Some(f) => data.filter_rows(&f.flags_for(data.index())),
        None => data.clone(),
    };
    let n = data.len();
    if n < 2 {
        return Err(QcError::LengthMismatch { what: "time derivative rows", expected: 2, actual: n });
    }
    let t = datetime_to_elapsedtime(data.index(), 0.0);

    let columns = data.columns().iter().map(|c| {
        let f = &c.values;
        let mut d = vec![0.0; n];
        d[0] = (f[1] - f[0]) / (t[1] - t[0]);
        d[n - 1] = (f[n - 1] - f[n - 2]) / (t[n - 1] - t[n - 2]);
        for i in 1..n - 1 {
            let hd = t[i] - t[i - 1];
            let hs = t[i + 1] - t[i];
            d[i] = (hd * hd * f[i + 1] - hs * hs * f[i - 1] + (hs * hs - hd * hd) * f[i]) / (hs * hd * (hd + hs));
        }
        (c.name.clone(), d)
    });
    Dataset::from_columns(data.index().to_vec(), columns)
}

#[derive(Default)]
struct Confusion {
    true_pos: usize,
    false_neg: usize,
    true_neg: usize,
    false_pos: usize,
}

// `false` marks an anomaly in both masks.
fn confusion(observed: &Mask, actual: &Mask, filter: Option<&TimeFilter>) -> QcResult<Vec<(String, Confusion)>> {
    same_columns(observed.column_names().to_vec(), actual.column_names().to_vec())?;
    if observed.rows() != actual.rows() {
        return Err(QcError::LengthMismatch { what: "mask rows", expected: observed.rows(), actual: actual.rows() });
    }
    let keep = keep_rows(observed.index(), filter);
    let mut out = Vec::with_capacity(observed.width());
    for (col, name) in observed.column_names().iter().enumerate() {
        let act = actual.column_by_name(name).ok_or_else(|| QcError::UndefinedColumn { column: name.clone() })?;
        let mut c = Confusion::default();
        for ((&o, &a), &k) in observed.column(col).iter().zip(act).zip(&keep) {
            if !k {
                continue;
            }
            match (o, a) {
                (false, false) => c.true_pos += 1,
                (true, false) => c.false_neg += 1,
                (true, true) => c.true_neg += 1,
                (false, true) => c.false_pos += 1,
            }
        }
        out.push((name.clone(), c));
    }
    Ok(out)
}

/// `TP / (TP + FN)` per column, treating `false` as anomalous
pub fn probability_of_detection(observed: &Mask, actual: &Mask, filter: Option<&TimeFilter>) -> QcResult<ColumnSeries> {
    let (names, values) = confusion(observed, actual, filter)?
        .into_iter()
        .map(|(name, c)| (name, c.true_pos as f64 / (c.true_pos + c.false_neg) as f64))
        .unzip();
    Ok(ColumnSeries::new(names, values))
}

/// `1 - TN / (TN + FP)` per column, treating `false` as anomalous
pub fn false_alarm_rate(observed: &Mask, actual: &Mask, filter: Option<&TimeFilter>) -> QcResult<ColumnSeries> {
    let (names, values) = confusion(observed, actual, filter)?
        .into_iter()
        .map(|(name, c)| (name, 1.0 - c.true_neg as f64 / (c.true_neg + c.false_pos) as f64))
        .unzip();
    Ok(ColumnSeries::new(names, values))
}
