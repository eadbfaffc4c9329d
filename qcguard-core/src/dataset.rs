//! Time-indexed tabular data
//!
//! ## Overview
//!
//! A [`Dataset`] is a timestamp index plus an ordered set of named `f64`
//! columns, one value per timestamp. NaN is the missing-value marker and
//! any non-finite value counts as missing.
//!
//! ```text
//! index      | Wave | Tide
//! -----------+------+------
//! 00:00      |  0.5 |  1.2
//! 00:15      |  NaN |  1.3      <- missing cell
//! 00:30      |  0.7 |  1.1
//! ```
//!
//! Storage is column-major: every column is a contiguous `Vec<f64>` so the
//! checks can run linear passes per variable.
//!
//! The index is allowed to be unsorted or hold duplicates when data is
//! loaded. The timestamp check sorts and de-duplicates it; windowed checks
//! require a sorted index.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::errors::{QcError, QcResult};
use crate::time::Timestamp;

/// Missing-value marker
pub const MISSING: f64 = f64::NAN;

/// True when `value` counts as missing (NaN or infinite)
#[inline]
pub fn is_missing(value: f64) -> bool {
    !value.is_finite()
}

/// One named data column
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name, unique within a dataset
    pub name: String,
    /// One value per index row
    pub values: Vec<f64>,
}

/// Timestamp index with aligned named columns
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    index: Vec<Timestamp>,
    columns: Vec<Column>,
}

impl Dataset {
    /// No rows, no columns
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dataset with an index and no columns
    pub fn new(index: Vec<Timestamp>) -> Self {
        Self { index, columns: Vec::new() }
    }

    /// Dataset from an index and `(name, values)` pairs
    pub fn from_columns<I, S>(index: Vec<Timestamp>, columns: I) -> QcResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut data = Self::new(index);
        for (name, values) in columns {
            data.insert_column(name, values)?;
        }
        Ok(data)
    }

    /// Builder form of [`Dataset::insert_column`]
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> QcResult<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Add a column, replacing any column with the same name
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> QcResult<()> {
        if values.len() != self.index.len() {
            return Err(QcError::LengthMismatch {
                what: "column",
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.columns[i].values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when there are no rows or no columns
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Timestamp index
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    /// All columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Position of a column by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// True when a column with this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Values of a column by name
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.values.as_slice())
    }

    /// Mutable values of a column by name
    pub fn column_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.columns.iter_mut().find(|c| c.name == name).map(|c| c.values.as_mut_slice())
    }

    /// Value at `(row, column position)`
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.columns.get(col).and_then(|c| c.values.get(row)).copied()
    }

    /// Row of the first occurrence of `t`
    pub fn row_of(&self, t: Timestamp) -> Option<usize> {
        self.index.iter().position(|&x| x == t)
    }

    /// New dataset holding only `names`, in the given order
    pub fn select(&self, names: &[String]) -> QcResult<Dataset> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let col = self
                .columns
                .iter()
                .find(|c| &c.name == name)
                .ok_or_else(|| QcError::UndefinedColumn { column: name.clone() })?;
            columns.push(col.clone());
        }
        Ok(Dataset { index: self.index.clone(), columns })
    }

    /// True when the index is non-decreasing
    pub fn is_monotonic(&self) -> bool {
        self.index.windows(2).all(|w| w[0] <= w[1])
    }

    /// Stable sort of rows by timestamp
    pub fn sort_by_index(&mut self) {
        if self.is_monotonic() {
            return;
        }
        let mut order: Vec<usize> = (0..self.index.len()).collect();
        order.sort_by_key(|&i| self.index[i]);
        self.take_rows(&order);
    }

    /// Drop repeated timestamps, keeping the first row of each
    pub fn dedup_index_keep_first(&mut self) -> usize {
        let mut seen = HashSet::with_capacity(self.index.len());
        let keep: Vec<usize> = (0..self.index.len()).filter(|&i| seen.insert(self.index[i])).collect();
        let dropped = self.index.len() - keep.len();
        if dropped > 0 {
            self.take_rows(&keep);
        }
        dropped
    }

    /// Conform to `new_index`
    ///
    /// Timestamps absent from the current index become all-missing rows and
    /// rows whose timestamp is not in `new_index` are dropped. Repeated
    /// timestamps take the first matching row.
    pub fn reindex(&self, new_index: &[Timestamp]) -> Dataset {
        let mut lookup: HashMap<Timestamp, usize> = HashMap::with_capacity(self.index.len());
        for (row, &t) in self.index.iter().enumerate() {
            lookup.entry(t).or_insert(row);
        }
        let rows: Vec<Option<usize>> = new_index.iter().map(|t| lookup.get(t).copied()).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: rows.iter().map(|r| r.map_or(MISSING, |i| c.values[i])).collect(),
            })
            .collect();
        Dataset { index: new_index.to_vec(), columns }
    }

    /// Rows where `keep[row]` is true
    pub fn filter_rows(&self, keep: &[bool]) -> Dataset {
        let len = self.index.len();
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| (k && i < len).then_some(i))
            .collect();
        let mut out = self.clone();
        out.take_rows(&rows);
        out
    }

    /// Row range whose timestamps fall in `[start, end]` (sorted index only)
    pub fn rows_between(&self, start: Timestamp, end: Timestamp) -> Range<usize> {
        let lo = self.index.partition_point(|&t| t < start);
        let hi = self.index.partition_point(|&t| t <= end);
        lo..hi.max(lo)
    }

    /// Merge `other` into `self`, preferring values already present
    ///
    /// Missing cells in `self` are filled from `other` and new columns are
    /// appended. When both indexes are identical the merge is positional,
    /// which keeps unsorted or duplicated timestamps intact for the
    /// timestamp check. Otherwise both sides are aligned on the sorted union
    /// of their timestamps.
    pub fn combine_first(&self, other: &Dataset) -> Dataset {
        if self.columns.is_empty() && self.index.is_empty() {
            return other.clone();
        }
        let (mut base, incoming) = if self.index == other.index {
            (self.clone(), other.clone())
        } else {
            let mut union: Vec<Timestamp> = self.index.iter().chain(other.index.iter()).copied().collect();
            union.sort();
            union.dedup();
            (self.reindex(&union), other.reindex(&union))
        };

        for col in incoming.columns {
            match base.position(&col.name) {
                Some(i) => {
                    for (dst, src) in base.columns[i].values.iter_mut().zip(col.values) {
                        if is_missing(*dst) {
                            *dst = src;
                        }
                    }
                }
                None => base.columns.push(col),
            }
        }
        base
    }

    fn take_rows(&mut self, rows: &[usize]) {
        self.index = rows.iter().map(|&i| self.index[i]).collect();
        for col in &mut self.columns {
            col.values = rows.iter().map(|&i| col.values[i]).collect();
        }
    }
}
