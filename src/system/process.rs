//! Subprocess spawning with concurrent output draining.
//!
//! stdout and stderr are read by two independent tasks so neither pipe can
//! fill up and stall the child. Lines are forwarded to the caller's sink while
//! the child runs. After exit the drains get a bounded grace period; a
//! grandchild holding a pipe open cannot block the caller past it. The child
//! is killed afterwards regardless.

use super::{LineSink, OutputLine, StreamKind};
use crate::error::ShellError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Spawn `program args...`, stream output to `on_line`, return the exit code.
pub async fn run_streaming(
    program: &str,
    args: &[&str],
    on_line: LineSink<'_>,
    drain_timeout: Duration,
) -> Result<i32, ShellError> {
    log::debug!("[Process] Spawning {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ShellError::SpawnFailed {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or(ShellError::StreamUnavailable("stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or(ShellError::StreamUnavailable("stderr"))?;

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<OutputLine>();
    let stdout_task = tokio::spawn(drain(stdout, StreamKind::Stdout, line_tx.clone()));
    let stderr_task = tokio::spawn(drain(stderr, StreamKind::Stderr, line_tx));

    let wait_result = loop {
        tokio::select! {
            Some(line) = line_rx.recv() => on_line(line),
            status = child.wait() => break status,
        }
    };

    // Channel closes once both drains are done
    let deadline = tokio::time::Instant::now() + drain_timeout;
    loop {
        tokio::select! {
            line = line_rx.recv() => match line {
                Some(line) => on_line(line),
                None => break,
            },
            _ = tokio::time::sleep_until(deadline) => {
                log::warn!(
                    "[Process] Output of '{}' still open after {:?}, abandoning drain",
                    program,
                    drain_timeout
                );
                break;
            }
        }
    }
    stdout_task.abort();
    stderr_task.abort();
    let _ = child.start_kill();

    let status = wait_result.map_err(|e| ShellError::WaitFailed {
        program: program.to_string(),
        reason: e.to_string(),
    })?;
    log::debug!("[Process] {} exited with {}", program, status);
    status.code().ok_or(ShellError::Signalled)
}

async fn drain<R>(reader: R, kind: StreamKind, tx: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(text)) => {
                if text.trim().is_empty() {
                    continue;
                }
                if tx.send(OutputLine { kind, text }).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = tx.send(OutputLine {
                    kind: StreamKind::Stderr,
                    text: format!("{} read error: {}", kind, e),
                });
                break;
            }
        }
    }
}

/// Run a short command and return its trimmed stdout when it exits 0.
pub async fn capture_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Read an Android system property; `None` when unset or `getprop` is missing.
pub async fn getprop(key: &str) -> Option<String> {
    capture_output("getprop", &[key])
        .await
        .filter(|value| !value.is_empty())
}

/// Kernel release of the running system: `/proc/sys/kernel/osrelease`, then
/// `uname -r`, then "unknown".
pub fn read_kernel_release() -> String {
    if let Ok(content) = std::fs::read_to_string("/proc/sys/kernel/osrelease") {
        let release = content.trim();
        if !release.is_empty() {
            return release.to_string();
        }
    }

    match std::process::Command::new("uname").arg("-r").output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_string(),
        Ok(_) => "unknown".to_string(),
        Err(e) => {
            log::debug!("[Process] uname -r failed: {}", e);
            "unknown".to_string()
        }
    }
}
