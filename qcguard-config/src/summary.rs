//! Serializable record of a finished QC run

use std::path::Path;

use qcguard_core::{ColumnSeries, DiagnosticSink, FailureInterval, QcEngine, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Results, quality index, and warnings of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Version of the engine that produced the run
    pub engine_version: String,
    /// Rows in the final dataset
    pub rows: usize,
    /// Columns in the final dataset
    pub columns: Vec<String>,
    /// First timestamp of the final dataset
    pub start: Option<Timestamp>,
    /// Last timestamp of the final dataset
    pub end: Option<Timestamp>,
    /// Failure intervals in append order
    pub results: Vec<FailureInterval>,
    /// Quality index per reported column
    pub quality_index: ColumnSeries,
    /// Warnings raised by skipped checks
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl RunSummary {
    /// Snapshot of `engine`, with the quality index over every column
    pub fn from_engine<S: DiagnosticSink>(engine: &QcEngine<S>) -> Self {
        let data = engine.data();
        Self {
            engine_version: qcguard_core::VERSION.to_string(),
            rows: data.len(),
            columns: data.column_names(),
            start: data.index().first().copied(),
            end: data.index().last().copied(),
            results: engine.results().to_vec(),
            quality_index: engine.quality_index(),
            warnings: Vec::new(),
        }
    }

    /// Replace the quality index
    pub fn with_quality_index(mut self, quality_index: ColumnSeries) -> Self {
        self.quality_index = quality_index;
        self
    }

    /// Attach warnings
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Failed timesteps per error flag, sorted by flag
    pub fn timesteps_by_flag(&self) -> Vec<(String, usize)> {
        let mut totals: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
        for r in &self.results {
            *totals.entry(r.error_flag.as_str()).or_default() += r.timesteps;
        }
        totals.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    /// Serialize as pretty JSON
    ///
    /// A quality index that could not be computed is written as `null`.
    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a summary written by [`RunSummary::to_json_pretty`]
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write pretty JSON to `path`
    pub fn write_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let text = self.to_json_pretty()?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
    }
}
