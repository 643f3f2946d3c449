//! Shared test doubles.

#![allow(dead_code)]

use futures::future::BoxFuture;
use gamecamp::config::StatusStore;
use gamecamp::kernel::AssetStore;
use gamecamp::system::{LineSink, OutputLine, StreamKind, SystemWrapper};
use gamecamp::{DriverOrchestrator, ShellError};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

type Responder = Box<dyn Fn(&str) -> Result<i32, ShellError> + Send + Sync>;

/// Privileged shell double that records every command it is asked to run.
pub struct RecordingShell {
    root: bool,
    kernel: String,
    output: Vec<OutputLine>,
    delay: Duration,
    privileged: Responder,
    plain: Responder,
    pub privileged_calls: Mutex<Vec<String>>,
    pub plain_calls: Mutex<Vec<String>>,
}

impl RecordingShell {
    pub fn new(kernel: &str) -> Self {
        RecordingShell {
            root: true,
            kernel: kernel.to_string(),
            output: Vec::new(),
            delay: Duration::ZERO,
            privileged: Box::new(|_| Ok(0)),
            plain: Box::new(|_| Ok(0)),
            privileged_calls: Mutex::new(Vec::new()),
            plain_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_root(mut self) -> Self {
        self.root = false;
        self
    }

    pub fn with_output(mut self, kind: StreamKind, text: &str) -> Self {
        self.output.push(OutputLine {
            kind,
            text: text.to_string(),
        });
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn on_privileged<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<i32, ShellError> + Send + Sync + 'static,
    {
        self.privileged = Box::new(f);
        self
    }

    pub fn on_plain<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<i32, ShellError> + Send + Sync + 'static,
    {
        self.plain = Box::new(f);
        self
    }

    pub fn privileged(&self) -> Vec<String> {
        self.privileged_calls.lock().unwrap().clone()
    }

    pub fn plain(&self) -> Vec<String> {
        self.plain_calls.lock().unwrap().clone()
    }
}

impl SystemWrapper for RecordingShell {
    fn has_root(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move { self.root })
    }

    fn kernel_release(&self) -> String {
        self.kernel.clone()
    }

    fn run_privileged<'a>(
        &'a self,
        command: &'a str,
        on_line: LineSink<'a>,
    ) -> BoxFuture<'a, Result<i32, ShellError>> {
        Box::pin(async move {
            self.privileged_calls.lock().unwrap().push(command.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if command.starts_with("sh ") {
                for line in &self.output {
                    on_line(line.clone());
                }
            }
            (self.privileged)(command)
        })
    }

    fn run_plain<'a>(
        &'a self,
        program: &'a str,
        args: &'a [&'a str],
    ) -> BoxFuture<'a, Result<i32, ShellError>> {
        Box::pin(async move {
            let line = std::iter::once(program)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.plain_calls.lock().unwrap().push(line.clone());
            (self.plain)(&line)
        })
    }
}

pub fn spawn_failed(program: &str) -> ShellError {
    ShellError::SpawnFailed {
        program: program.to_string(),
        reason: "No such file or directory".to_string(),
    }
}

/// Asset root with `drivers/RT-devpro/<files>`.
pub fn assets_with(files: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("drivers").join("RT-devpro");
    std::fs::create_dir_all(&folder).unwrap();
    for file in files {
        std::fs::write(folder.join(file), "#!/system/bin/sh\necho flashing\n").unwrap();
    }
    dir
}

pub fn orchestrator(
    shell: Arc<RecordingShell>,
    assets: &Path,
    cache: &Path,
    store: Arc<StatusStore>,
) -> DriverOrchestrator {
    DriverOrchestrator::new(shell, AssetStore::new(assets), store, cache).with_reboot_delay(3)
}
