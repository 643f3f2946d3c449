//! System module: privileged shell access, root detection, device information.
//!
//! All privileged work goes through the [`SystemWrapper`] trait so the
//! sequencer can be driven by the real `su` shell, the simulated development
//! shell, or a test double.

pub mod info;
pub mod process;
pub mod root;
pub mod shell;
pub mod simulated;

use futures::future::BoxFuture;
use std::fmt;

pub use process::{capture_output, getprop, read_kernel_release, run_streaming};
pub use shell::SuShell;
pub use simulated::SimulatedShell;

use crate::error::ShellError;

/// Logging macros for convenient access
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        log::info!("{}", msg);
    }}
}

#[macro_export]
macro_rules! log_parsed {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        // target="parsed" marks high-level milestones
        log::info!(target: "parsed", "{}", msg);
    }}
}

/// Which pipe a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => write!(f, "stdout"),
            StreamKind::Stderr => write!(f, "stderr"),
        }
    }
}

/// One line of subprocess output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub kind: StreamKind,
    pub text: String,
}

/// Callback receiving output lines as they are read.
pub type LineSink<'a> = &'a (dyn Fn(OutputLine) + Send + Sync);

/// Trait for system-level operations.
///
/// `Ok(code)` means the command ran and exited with `code`; `Err` means it
/// could not be started or waited for.
pub trait SystemWrapper: Send + Sync {
    /// Whether superuser access is usable right now.
    fn has_root(&self) -> BoxFuture<'_, bool>;

    /// Raw kernel release string of the device.
    fn kernel_release(&self) -> String;

    /// Run `command` through the superuser shell, streaming its output.
    fn run_privileged<'a>(
        &'a self,
        command: &'a str,
        on_line: LineSink<'a>,
    ) -> BoxFuture<'a, Result<i32, ShellError>>;

    /// Run a program directly, without superuser.
    fn run_plain<'a>(
        &'a self,
        program: &'a str,
        args: &'a [&'a str],
    ) -> BoxFuture<'a, Result<i32, ShellError>>;
}

/// Run a privileged command and collect its stdout, trimmed.
pub async fn capture_privileged(system: &dyn SystemWrapper, command: &str) -> Result<String, ShellError> {
    let collected = std::sync::Mutex::new(Vec::<String>::new());
    let sink = |line: OutputLine| {
        if line.kind == StreamKind::Stdout {
            if let Ok(mut lines) = collected.lock() {
                lines.push(line.text);
            }
        }
    };
    system.run_privileged(command, &sink).await?;
    let lines = collected.into_inner().unwrap_or_else(|e| e.into_inner());
    Ok(lines.join("\n").trim().to_string())
}
