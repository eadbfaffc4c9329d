//! Pass/fail grids
//!
//! A [`Mask`] has the same shape as a [`Dataset`](crate::Dataset): one
//! boolean per `(timestamp, column)` cell, `true` meaning the cell passed.
//! Cells are stored column-major to match the dataset layout, so the interval
//! extractor walks each column as one contiguous slice.

use crate::errors::{QcError, QcResult};
use crate::time::Timestamp;

/// Boolean grid aligned with a timestamp index (`true` = pass)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    index: Vec<Timestamp>,
    names: Vec<String>,
    cells: Vec<Vec<bool>>,
    // Fixed with the index; decides how `fill_between` finds its rows
    sorted: bool,
}

fn is_sorted(index: &[Timestamp]) -> bool {
    index.windows(2).all(|w| w[0] <= w[1])
}

impl Mask {
    /// Grid of `value` over `index` x `names`
    pub fn filled(index: &[Timestamp], names: &[String], value: bool) -> Self {
        Self {
            index: index.to_vec(),
            names: names.to_vec(),
            cells: vec![vec![value; index.len()]; names.len()],
            sorted: is_sorted(index),
        }
    }

    /// Grid from explicit per-column cells
    pub fn from_columns(index: Vec<Timestamp>, names: Vec<String>, cells: Vec<Vec<bool>>) -> QcResult<Self> {
        if names.len() != cells.len() {
            return Err(QcError::LengthMismatch {
                what: "mask columns",
                expected: names.len(),
                actual: cells.len(),
            });
        }
        if let Some(bad) = cells.iter().find(|c| c.len() != index.len()) {
            return Err(QcError::LengthMismatch {
                what: "mask column",
                expected: index.len(),
                actual: bad.len(),
            });
        }
        let sorted = is_sorted(&index);
        Ok(Self { index, names, cells, sorted })
    }

    /// Single unnamed column, used for index-wide timestamp checks
    pub fn single(index: Vec<Timestamp>, cells: Vec<bool>) -> Self {
        let sorted = is_sorted(&index);
        Self { index, names: vec![String::new()], cells: vec![cells], sorted }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.index.len()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Timestamp index
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    /// Column names
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Cells of column `col`
    pub fn column(&self, col: usize) -> &[bool] {
        &self.cells[col]
    }

    /// Mutable cells of column `col`
    pub fn column_mut(&mut self, col: usize) -> &mut [bool] {
        &mut self.cells[col]
    }

    /// Cells of a column by name
    pub fn column_by_name(&self, name: &str) -> Option<&[bool]> {
        self.names.iter().position(|n| n == name).map(|i| self.cells[i].as_slice())
    }

    /// Cell value
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[col][row]
    }

    /// Set a cell
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.cells[col][row] = value;
    }

    /// Force every cell of `row` to pass
    pub fn pass_row(&mut self, row: usize) {
        for col in &mut self.cells {
            col[row] = true;
        }
    }

    /// True when no cell failed
    pub fn all_pass(&self) -> bool {
        self.cells.iter().all(|c| c.iter().all(|&v| v))
    }

    /// Number of failed cells
    pub fn failure_count(&self) -> usize {
        self.cells.iter().map(|c| c.iter().filter(|&&v| !v).count()).sum()
    }

    /// Set `value` on every row of `col` whose timestamp lies in `[start, end]`
    ///
    /// Uses binary search on a sorted index and falls back to a scan.
    /// Sortedness is computed once, when the mask is built.
    pub fn fill_between(&mut self, col: usize, start: Timestamp, end: Timestamp, value: bool) {
        let cells = &mut self.cells[col];
        if self.sorted {
            let lo = self.index.partition_point(|&t| t < start);
            let hi = self.index.partition_point(|&t| t <= end);
            for cell in cells.iter_mut().take(hi).skip(lo) {
                *cell = value;
            }
        } else {
            for (cell, &t) in cells.iter_mut().zip(&self.index) {
                if t >= start && t <= end {
                    *cell = value;
                }
            }
        }
    }

    /// True when the index is in non-decreasing order
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Rows where `keep[row]` is true
    pub fn filter_rows(&self, keep: &[bool]) -> Mask {
        let pick = |row: usize| keep.get(row).copied().unwrap_or(false);
        let index: Vec<Timestamp> = self.index.iter().enumerate().filter(|(i, _)| pick(*i)).map(|(_, &t)| t).collect();
        Mask {
            // a subsequence of a sorted index is sorted
            sorted: self.sorted || is_sorted(&index),
            index,
            names: self.names.clone(),
            cells: self
                .cells
                .iter()
                .map(|c| c.iter().enumerate().filter(|(i, _)| pick(*i)).map(|(_, &v)| v).collect())
                .collect(),
        }
    }
}
