//! Translation registry
//!
//! Groups physical columns under logical keys so one check can cover many
//! channels at once:
//!
//! ```text
//! "Wave"  -> ["Wave1", "Wave2", "Wave3"]
//! "Power" -> ["DC Power", "AC Power"]
//! "Wave1" -> ["Wave1"]                     <- identity entry from add_dataset
//! ```
//!
//! Entries are not validated when registered. A [`Selector`] is resolved
//! against the dataset at the moment a check runs, and a reference to a
//! column that no longer exists is reported then.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::errors::{QcError, QcResult};

/// Which columns a check applies to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Every column in the dataset
    #[default]
    All,
    /// One column by name
    Column(String),
    /// Every column registered under a translation key
    Key(String),
}

impl Selector {
    /// Select one column
    pub fn column(name: impl Into<String>) -> Self {
        Selector::Column(name.into())
    }

    /// Select a translation group
    pub fn key(key: impl Into<String>) -> Self {
        Selector::Key(key.into())
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::All => write!(f, "all columns"),
            Selector::Column(name) => write!(f, "column '{}'", name),
            Selector::Key(key) => write!(f, "key '{}'", key),
        }
    }
}

/// Mapping from logical key to ordered column names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationRegistry {
    entries: HashMap<String, Vec<String>>,
}

impl TranslationRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key`, replacing any previous entry
    pub fn insert<I, S>(&mut self, key: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(key.into(), columns.into_iter().map(Into::into).collect());
    }

    /// Register every `(key, columns)` pair
    pub fn extend<I, K, C, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (key, columns) in entries {
            self.insert(key, columns);
        }
    }

    /// Columns registered under `key`
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// True when `key` is registered
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no key is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a selector into concrete column names present in `data`
    pub fn resolve(&self, selector: &Selector, data: &Dataset) -> QcResult<Vec<String>> {
        let columns = match selector {
            Selector::All => return Ok(data.column_names()),
            Selector::Column(name) => vec![name.clone()],
            Selector::Key(key) => self
                .get(key)
                .ok_or_else(|| QcError::UndefinedKey { key: key.clone() })?
                .to_vec(),
        };
        if let Some(missing) = columns.iter().find(|c| !data.has_column(c)) {
            return Err(QcError::UndefinedColumn { column: missing.clone() });
        }
        Ok(columns)
    }
}
