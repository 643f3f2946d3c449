//! Decoupled logging pipeline for driver operations.
//!
//! Every `log::*` record and every terminal line ends up on disk, even when
//! nobody is watching the optional UI channel.
//!
//! ```text
//! log::info!() / TerminalLog
//!     |
//! [LogCollector] (crossbeam unbounded channel, never blocks)
//!     |
//! [Disk persister thread] ---> logs/full/<ts>_full.log
//!     |                  \--> logs/parsed/<ts>_parsed.log  (target = "parsed")
//!     v
//! UI channel (try_send, lossy when full)
//! ```

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{LevelFilter, Log, Metadata, Record};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Internal log line or special marker
enum LogMessage {
    Line(LogLine),
    /// Flush marker; the sender is signalled once every earlier line is written
    Flush(std::sync::mpsc::Sender<()>),
}

/// Default logs directory: `<data dir>/gamecamp/logs`, or `./logs` when the
/// platform has no data directory.
pub fn get_global_logs_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gamecamp").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Ensure the logs directory exists
pub fn ensure_logs_dir_exists(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("Failed to create logs directory: {}", e))
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    /// "full" or "parsed"
    pub log_type: String,
    pub timestamp: String,
}

impl LogLine {
    pub fn new(message: String) -> Self {
        LogLine {
            message,
            log_type: "full".to_string(),
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    pub fn parsed(message: String) -> Self {
        LogLine {
            log_type: "parsed".to_string(),
            ..LogLine::new(message)
        }
    }

    fn formatted(&self) -> String {
        format!("[{}] {}\n", self.timestamp, self.message)
    }
}

/// Unified logger that handles disk and UI dispatch
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    log_dir: PathBuf,
    max_level: LevelFilter,
    /// Explicit session file, set by `start_new_session`
    session_path: Arc<Mutex<Option<PathBuf>>>,
}

impl LogCollector {
    /// Create a collector and spawn its disk persister thread.
    pub fn new(
        log_dir: PathBuf,
        ui_tx: Option<tokio::sync::mpsc::Sender<LogLine>>,
    ) -> Result<Self, String> {
        let full_log_dir = log_dir.join("full");
        let parsed_log_dir = log_dir.join("parsed");
        std::fs::create_dir_all(&full_log_dir)
            .map_err(|e| format!("Failed to create full log dir: {}", e))?;
        std::fs::create_dir_all(&parsed_log_dir)
            .map_err(|e| format!("Failed to create parsed log dir: {}", e))?;

        let (tx, rx) = unbounded::<LogMessage>();
        let session_path: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
        let session_path_thread = Arc::clone(&session_path);

        // OS thread rather than a tokio task: records arrive from any runtime
        // or from plain threads and must all reach disk.
        std::thread::spawn(move || {
            let mut handles: HashMap<&'static str, (PathBuf, File)> = HashMap::new();

            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let session = session_path_thread.lock().ok().and_then(|s| s.clone());
                        let full_target = match session {
                            Some(path) => Some(path),
                            None => handles
                                .get("full")
                                .map(|(p, _)| p.clone())
                                .or_else(|| new_log_path(&full_log_dir, "full").ok()),
                        };
                        if let Some(path) = full_target {
                            write_line(&mut handles, "full", &path, &line);
                        }

                        if line.log_type == "parsed" {
                            let parsed_target = handles
                                .get("parsed")
                                .map(|(p, _)| p.clone())
                                .or_else(|| new_log_path(&parsed_log_dir, "parsed").ok());
                            if let Some(path) = parsed_target {
                                write_line(&mut handles, "parsed", &path, &line);
                            }
                        }

                        if let Some(ref ui) = ui_tx {
                            let _ = ui.try_send(line);
                        }
                    }
                    LogMessage::Flush(done) => {
                        for (_, file) in handles.values_mut() {
                            let _ = file.flush();
                        }
                        let _ = done.send(());
                    }
                }
            }
            eprintln!("[Log] Disk persister thread shutting down");
        });

        Ok(LogCollector {
            tx,
            log_dir,
            max_level: LevelFilter::Info,
            session_path,
        })
    }

    pub fn with_max_level(mut self, level: LevelFilter) -> Self {
        self.max_level = level;
        self
    }

    pub fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Route all further full-log lines to `logs/full/<filename>`.
    pub fn start_new_session(&self, filename: &str) -> Result<PathBuf, String> {
        let path = self.log_dir.join("full").join(filename);
        let mut session = self
            .session_path
            .lock()
            .map_err(|e| format!("Failed to lock session state: {}", e))?;
        *session = Some(path.clone());
        Ok(path)
    }

    pub fn get_session_log_path(&self) -> Option<PathBuf> {
        self.session_path.lock().ok().and_then(|s| s.clone())
    }

    /// Send a log line (non-blocking)
    pub fn log(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    pub fn log_str(&self, message: impl Into<String>) {
        self.log(LogLine::new(message.into()));
    }

    pub fn log_parsed(&self, message: impl Into<String>) {
        self.log(LogLine::parsed(message.into()));
    }

    /// Wait until every line sent before this call has been written.
    pub async fn wait_for_empty(&self) -> Result<(), String> {
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(done_tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;

        tokio::task::spawn_blocking(move || done_rx.recv())
            .await
            .map_err(|e| format!("Flush task failed: {}", e))?
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("[{}] {}", record.level(), record.args());
        if record.target() == "parsed" {
            self.log_parsed(message);
        } else {
            self.log_str(message);
        }
    }

    fn flush(&self) {}
}

fn write_line(
    handles: &mut HashMap<&'static str, (PathBuf, File)>,
    kind: &'static str,
    path: &Path,
    line: &LogLine,
) {
    let stale = handles.get(kind).map_or(true, |(p, _)| p != path);
    if stale {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                handles.insert(kind, (path.to_path_buf(), file));
            }
            Err(e) => {
                eprintln!("[Log] Failed to open {}: {}", path.display(), e);
                return;
            }
        }
    }
    if let Some((_, file)) = handles.get_mut(kind) {
        let _ = file.write_all(line.formatted().as_bytes());
        let _ = file.flush();
    }
}

/// Fresh `<ts>_<kind>.log` path in `dir`.
fn new_log_path(dir: &Path, kind: &str) -> Result<PathBuf, String> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}_{}.log", timestamp, kind));
    File::create(&path).map_err(|e| format!("Failed to create log file: {}", e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn read_all_logs(dir: &Path) -> String {
        let mut out = String::new();
        if let Ok(entries) = fs::read_dir(dir) {
            for e in entries.filter_map(|e| e.ok()) {
                out.push_str(&fs::read_to_string(e.path()).unwrap_or_default());
            }
        }
        out
    }

    #[tokio::test]
    async fn test_log_collector_creates_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = LogCollector::new(temp.path().to_path_buf(), None);
        assert!(result.is_ok());
        assert!(temp.path().join("full").exists());
        assert!(temp.path().join("parsed").exists());
    }

    #[tokio::test]
    async fn test_lines_reach_disk_after_flush() {
        let temp = tempfile::TempDir::new().unwrap();
        let collector = LogCollector::new(temp.path().to_path_buf(), None).unwrap();

        for i in 0..100 {
            collector.log_str(format!("line {}", i));
        }
        collector.log_parsed("milestone");
        collector.wait_for_empty().await.unwrap();

        let full = read_all_logs(&temp.path().join("full"));
        assert!(full.contains("line 0"));
        assert!(full.contains("line 99"));
        assert!(full.contains("milestone"));
        let parsed = read_all_logs(&temp.path().join("parsed"));
        assert!(parsed.contains("milestone"));
        assert!(!parsed.contains("line 0"));
    }

    #[tokio::test]
    async fn test_session_path_redirects_lines() {
        let temp = tempfile::TempDir::new().unwrap();
        let collector = LogCollector::new(temp.path().to_path_buf(), None).unwrap();
        let session = collector.start_new_session("install_session.log").unwrap();
        collector.log_str("inside session");
        collector.wait_for_empty().await.unwrap();

        assert_eq!(collector.get_session_log_path(), Some(session.clone()));
        assert!(fs::read_to_string(session).unwrap().contains("inside session"));
    }

    #[tokio::test]
    async fn test_ui_channel_receives_lines() {
        let temp = tempfile::TempDir::new().unwrap();
        let (ui_tx, mut ui_rx) = tokio::sync::mpsc::channel(16);
        let collector = LogCollector::new(temp.path().to_path_buf(), Some(ui_tx)).unwrap();
        collector.log_str("to ui");
        collector.wait_for_empty().await.unwrap();

        let line = ui_rx.recv().await.unwrap();
        assert_eq!(line.message, "to ui");
        assert_eq!(line.log_type, "full");
    }
}
