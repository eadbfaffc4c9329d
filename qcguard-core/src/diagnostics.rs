//! Diagnostics sink
//!
//! The engine never writes to a global logger directly. It reports through a
//! [`DiagnosticSink`] it owns from construction until [`QcEngine::into_parts`]
//! hands it back, so report generation can read the warnings a run produced.
//!
//! ```text
//! QcEngine ──report()──> DiagnosticSink
//!                           ├── LogSink     -> log facade (target "qcguard")
//!                           ├── MemorySink  -> shared Vec<Diagnostic>
//!                           └── TeeSink     -> both of the above
//! ```
//!
//! [`QcEngine::into_parts`]: crate::engine::QcEngine::into_parts

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// Log target used by [`LogSink`]
pub const LOG_TARGET: &str = "qcguard";

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Progress information
    Info,
    /// A check was skipped or degraded
    Warning,
}

/// One recorded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity
    pub level: Level,
    /// Message text
    pub message: String,
}

/// Destination for engine diagnostics
pub trait DiagnosticSink: Send {
    /// Record one message
    fn report(&mut self, level: Level, message: &str);

    /// Record an informational message
    fn info(&mut self, message: &str) {
        self.report(Level::Info, message);
    }

    /// Record a warning
    fn warn(&mut self, message: &str) {
        self.report(Level::Warning, message);
    }
}

/// Forwards diagnostics to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, level: Level, message: &str) {
        match level {
            Level::Info => log::info!(target: LOG_TARGET, "{}", message),
            Level::Warning => log::warn!(target: LOG_TARGET, "{}", message),
        }
    }
}

/// Collects diagnostics in memory
///
/// Clones share one buffer: keep a clone, hand the other to the engine, and
/// read the entries after the run.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoned locks are recovered; pushes are atomic with respect to panics.
    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All recorded diagnostics
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Messages recorded at warning level
    pub fn warnings(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .map(|d| d.message.clone())
            .collect()
    }

    /// Drop all recorded diagnostics
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&mut self, level: Level, message: &str) {
        self.lock().push(Diagnostic { level, message: message.to_string() });
    }
}

/// Sends every diagnostic to two sinks
pub struct TeeSink<A, B> {
    first: A,
    second: B,
}

impl<A: DiagnosticSink, B: DiagnosticSink> TeeSink<A, B> {
    /// Combine two sinks
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: DiagnosticSink, B: DiagnosticSink> DiagnosticSink for TeeSink<A, B> {
    fn report(&mut self, level: Level, message: &str) {
        self.first.report(level, message);
        self.second.report(level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_shares_buffer() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle.info("Check for missing data");
        handle.warn("Undefined key 'Wave'");

        assert_eq!(sink.entries().len(), 2);
        assert_eq!(sink.warnings(), vec!["Undefined key 'Wave'".to_string()]);

        sink.clear();
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn tee_reaches_both() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let mut tee = TeeSink::new(a.clone(), TeeSink::new(LogSink, b.clone()));
        tee.warn("skipped");
        assert_eq!(a.warnings(), b.warnings());
    }
}
