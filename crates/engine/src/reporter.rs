//! Logging sink threaded through engine runs.
//!
//! Engines never log globally; they take a `&dyn Reporter`. The CLI passes a
//! [`TracingReporter`], tests pass a [`CaptureReporter`] and assert on what
//! was said.

use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReportLevel {
    Debug,
    Info,
    Error,
}

pub trait Reporter {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing` under the `cellcheck` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "cellcheck", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "cellcheck", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "cellcheck", "{message}");
    }
}

/// Collects messages in memory.
#[derive(Debug, Default)]
pub struct CaptureReporter {
    messages: RefCell<Vec<(ReportLevel, String)>>,
}

impl CaptureReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(ReportLevel, String)> {
        self.messages.borrow().clone()
    }

    /// Messages at exactly `level`.
    pub fn at(&self, level: ReportLevel) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// True if any message at any level contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.borrow().iter().any(|(_, m)| m.contains(needle))
    }

    fn push(&self, level: ReportLevel, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}

impl Reporter for CaptureReporter {
    fn debug(&self, message: &str) {
        self.push(ReportLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(ReportLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(ReportLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_reporter() {
        let reporter = CaptureReporter::new();
        reporter.info("Validating file data.csv");
        reporter.error("Missing fields: c");
        reporter.debug("row 2");

        assert_eq!(reporter.messages().len(), 3);
        assert_eq!(reporter.at(ReportLevel::Error), vec!["Missing fields: c"]);
        assert!(reporter.contains("data.csv"));
        assert!(!reporter.contains("nothing"));
    }
}
