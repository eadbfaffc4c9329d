//! Static custom checks
//!
//! A [`StaticClassifier`] sees the selected columns all at once and returns
//! its own pass/fail mask plus a metadata frame. Intervals are named after
//! the mask's columns.

use serde::{Deserialize, Serialize};

use super::default_min_failures;
use crate::dataset::Dataset;
use crate::errors::{QcError, QcResult};
use crate::mask::Mask;
use crate::translation::Selector;

/// Output of a static classifier
#[derive(Debug, Clone)]
pub struct StaticOutput {
    /// Pass/fail grid with the input's columns and index
    pub mask: Mask,
    /// Caller-defined metadata on the input's index
    pub metadata: Dataset,
}

/// Classifies a whole dataset at once
pub trait StaticClassifier {
    /// Build a mask for `data`
    fn classify(&mut self, data: &Dataset) -> StaticOutput;
}

impl<F> StaticClassifier for F
where
    F: FnMut(&Dataset) -> StaticOutput,
{
    fn classify(&mut self, data: &Dataset) -> StaticOutput {
        self(data)
    }
}

/// Options for a static custom check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStaticCheck {
    /// Columns handed to the classifier
    #[serde(default)]
    pub selector: Selector,
    /// Shortest failed run to report
    #[serde(default = "default_min_failures")]
    pub min_failures: usize,
    /// Label for reported intervals
    #[serde(default = "default_message")]
    pub error_message: String,
}

fn default_message() -> String {
    "Custom".to_string()
}

impl Default for CustomStaticCheck {
    fn default() -> Self {
        Self { selector: Selector::All, min_failures: 1, error_message: default_message() }
    }
}

impl CustomStaticCheck {
    /// Static check with a label
    pub fn new(error_message: impl Into<String>) -> Self {
        Self { error_message: error_message.into(), ..Self::default() }
    }

    /// Restrict to a selector
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Set the shortest reported run
    pub fn min_failures(mut self, n: usize) -> Self {
        self.min_failures = n;
        self
    }
}

/// Run `classifier` over `data` and check the output lines up with it
///
/// The mask must carry the input's columns and index. Metadata may hold any
/// columns but must share the input's index.
pub fn run_static<C>(data: &Dataset, classifier: &mut C) -> QcResult<StaticOutput>
where
    C: StaticClassifier + ?Sized,
{
    let out = classifier.classify(data);
    if out.mask.rows() != data.len() {
        return Err(QcError::ClassifierShape { expected: data.len(), actual: out.mask.rows() });
    }
    if out.mask.column_names() != data.column_names().as_slice() {
        return Err(QcError::ClassifierLayout { part: "mask columns" });
    }
    if out.mask.index() != data.index() {
        return Err(QcError::ClassifierLayout { part: "mask index" });
    }
    if out.metadata.len() != data.len() {
        return Err(QcError::ClassifierShape { expected: data.len(), actual: out.metadata.len() });
    }
    if out.metadata.index() != data.index() {
        return Err(QcError::ClassifierLayout { part: "metadata index" });
    }
    Ok(out)
}
