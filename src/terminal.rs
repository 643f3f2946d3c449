//! Append-only terminal log for privileged operations.
//!
//! The sequencer is the only writer. Readers subscribe to a `watch` channel
//! and always observe a prefix-growing list: entries are never reordered or
//! edited, only appended, and the whole list is cleared when a new operation
//! starts or the log viewer is dismissed.
//!
//! Every entry is mirrored to the `log` facade under the `terminal` target so
//! the on-disk log carries the same lines.

use crate::models::{LogSeverity, TerminalLogEntry};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct TerminalLog {
    tx: Arc<watch::Sender<Vec<TerminalLogEntry>>>,
}

impl Default for TerminalLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalLog {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        TerminalLog { tx: Arc::new(tx) }
    }

    /// Observe the log. The receiver sees the current list immediately.
    pub fn subscribe(&self) -> watch::Receiver<Vec<TerminalLogEntry>> {
        self.tx.subscribe()
    }

    pub fn push(&self, text: impl Into<String>, severity: LogSeverity) {
        let entry = TerminalLogEntry::new(text, severity);
        match severity {
            LogSeverity::Error => log::error!(target: "terminal", "{}", entry.text),
            LogSeverity::Warning => log::warn!(target: "terminal", "{}", entry.text),
            _ => log::info!(target: "terminal", "{}{}", severity.glyph(), entry.text),
        }
        self.tx.send_modify(|entries| entries.push(entry));
    }

    pub fn info(&self, text: impl Into<String>) {
        self.push(text, LogSeverity::Info);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.push(text, LogSeverity::Success);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.push(text, LogSeverity::Error);
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.push(text, LogSeverity::Warning);
    }

    pub fn command(&self, text: impl Into<String>) {
        self.push(text, LogSeverity::Command);
    }

    pub fn progress(&self, text: impl Into<String>) {
        self.push(text, LogSeverity::Progress);
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> Vec<TerminalLogEntry> {
        self.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.tx.send_modify(|entries| entries.clear());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_appends_in_order() {
        let log = TerminalLog::new();
        log.info("one");
        log.success("two");
        log.command("three");

        let texts: Vec<_> = log.entries().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert!(log.entries()[2].is_command);
    }

    #[test]
    fn test_clear_empties_log() {
        let log = TerminalLog::new();
        log.error("boom");
        assert_eq!(log.len(), 1);
        log.clear();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_subscriber_sees_growth() {
        let log = TerminalLog::new();
        let mut rx = log.subscribe();
        assert!(rx.borrow().is_empty());

        log.progress("working");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
        assert_eq!(rx.borrow()[0].severity, LogSeverity::Progress);
    }
}
