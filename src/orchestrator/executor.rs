//! Step execution: running the staged driver script and rebooting the device.
//!
//! Both steps report into the terminal log in the order they happen. Script
//! output is forwarded line by line as it is read: stdout as Info, stderr as
//! Error.

use crate::error::ShellError;
use crate::kernel::assets::is_executable;
use crate::system::{OutputLine, StreamKind, SystemWrapper};
use crate::terminal::TerminalLog;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Characters that never need quoting in a `sh -c` argument.
static SHELL_SAFE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9/._\-+=:,@]+$").ok());

/// How the privileged script run ended.
#[derive(Debug)]
pub enum ScriptRun {
    /// The script ran; carries its exit code
    Exited(i32),
    /// The staged file was gone or lost its executable bit
    NotExecutable,
    /// `su` could not be started or waited for
    Failed(ShellError),
}

/// Quote `arg` for inclusion in a shell command line.
pub fn shell_quote(arg: &str) -> String {
    let safe = SHELL_SAFE
        .as_ref()
        .map(|re| re.is_match(arg))
        .unwrap_or(false);
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Run `sh <script>` through the privileged shell.
pub async fn execute_driver_script(
    system: &dyn SystemWrapper,
    script: &Path,
    kernel_version: &str,
    log: &TerminalLog,
) -> ScriptRun {
    if !script.exists() || !is_executable(script) {
        log.error("Driver file is missing or not executable");
        return ScriptRun::NotExecutable;
    }

    let command = format!("sh {}", shell_quote(&script.to_string_lossy()));
    log.command(format!("Executing command: {}", command));
    log.info(format!("Target kernel version: {}", kernel_version));

    let forward = |line: OutputLine| match line.kind {
        StreamKind::Stdout => log.info(line.text),
        StreamKind::Stderr => log.error(line.text),
    };

    match system.run_privileged(&command, &forward).await {
        Ok(0) => {
            log.success("Script finished, exit code: 0");
            log.success("✓ Driver installation complete");
            ScriptRun::Exited(0)
        }
        Ok(code) => {
            log.error(format!("Script failed, exit code: {}", code));
            ScriptRun::Exited(code)
        }
        Err(e) => {
            log.error(format!("Failed to execute driver script: {}", e));
            ScriptRun::Failed(e)
        }
    }
}

/// Reboot via `su -c "sleep N && reboot"`, falling back to a bare `reboot`
/// when `su` itself cannot be started. Returns whether the reboot command
/// launched and exited 0; the device may or may not actually go down.
pub async fn reboot_device(system: &dyn SystemWrapper, delay_secs: u64, log: &TerminalLog) -> bool {
    let command = format!("sleep {} && reboot", delay_secs);
    let forward = |line: OutputLine| {
        if line.kind == StreamKind::Stderr {
            log.warning(line.text);
        }
    };

    match system.run_privileged(&command, &forward).await {
        Ok(0) => {
            crate::log_parsed!("Reboot scheduled in {}s", delay_secs);
            true
        }
        Ok(code) => {
            log::warn!("[Executor] Reboot command exited with {}", code);
            false
        }
        Err(e) => {
            log::warn!("[Executor] Privileged reboot failed ({}), trying plain reboot", e);
            match system.run_plain("reboot", &[]).await {
                Ok(0) => true,
                Ok(code) => {
                    log::warn!("[Executor] Plain reboot exited with {}", code);
                    false
                }
                Err(e) => {
                    log::error!("[Executor] Plain reboot failed: {}", e);
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogSeverity;
    use crate::system::SuShell;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("5.10.sh");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/data/cache/5.10.sh"), "/data/cache/5.10.sh");
        assert_eq!(shell_quote("/tmp/my dir/x.sh"), "'/tmp/my dir/x.sh'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[tokio::test]
    async fn test_script_output_is_forwarded_by_stream() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "echo flashing\necho warn >&2\nexit 0\n");
        let log = TerminalLog::new();

        let run = execute_driver_script(&SuShell::new("sh"), &script, "5.10.66", &log).await;
        assert!(matches!(run, ScriptRun::Exited(0)));

        let entries = log.entries();
        assert_eq!(entries[0].severity, LogSeverity::Command);
        assert!(entries.iter().any(|e| e.text == "flashing" && e.severity == LogSeverity::Info));
        assert!(entries.iter().any(|e| e.text == "warn" && e.severity == LogSeverity::Error));
        assert_eq!(entries.last().unwrap().severity, LogSeverity::Success);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "exit 2\n");
        let log = TerminalLog::new();

        let run = execute_driver_script(&SuShell::new("sh"), &script, "5.10.66", &log).await;
        assert!(matches!(run, ScriptRun::Exited(2)));
        assert_eq!(log.entries().last().unwrap().text, "Script failed, exit code: 2");
    }

    #[tokio::test]
    async fn test_missing_script_never_runs() {
        let log = TerminalLog::new();
        let run = execute_driver_script(
            &SuShell::new("sh"),
            Path::new("/nonexistent/5.10.sh"),
            "5.10.66",
            &log,
        )
        .await;
        assert!(matches!(run, ScriptRun::NotExecutable));
        assert!(log.entries().iter().all(|e| e.severity != LogSeverity::Command));
    }
}
