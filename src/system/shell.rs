//! The real superuser shell: every privileged command runs as
//! `<su_binary> -c "<command>"`.

use super::process::{read_kernel_release, run_streaming};
use super::{LineSink, OutputLine, SystemWrapper};
use crate::error::ShellError;
use futures::future::BoxFuture;
use std::time::Duration;

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SuShell {
    su_binary: String,
    drain_timeout: Duration,
    kernel_override: Option<String>,
}

impl SuShell {
    pub fn new(su_binary: impl Into<String>) -> Self {
        SuShell {
            su_binary: su_binary.into(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            kernel_override: None,
        }
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Report `release` instead of reading the running kernel.
    pub fn with_kernel_release(mut self, release: Option<String>) -> Self {
        self.kernel_override = release;
        self
    }

    pub fn su_binary(&self) -> &str {
        &self.su_binary
    }
}

impl Default for SuShell {
    fn default() -> Self {
        SuShell::new("su")
    }
}

impl SystemWrapper for SuShell {
    fn has_root(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let quiet = |_: OutputLine| {};
            match run_streaming(&self.su_binary, &["-c", "exit"], &quiet, self.drain_timeout).await {
                Ok(0) => true,
                Ok(code) => {
                    log::info!("[SuShell] Root probe exited with {}", code);
                    false
                }
                Err(e) => {
                    log::info!("[SuShell] Root probe failed: {}", e);
                    false
                }
            }
        })
    }

    fn kernel_release(&self) -> String {
        match &self.kernel_override {
            Some(release) => release.clone(),
            None => read_kernel_release(),
        }
    }

    fn run_privileged<'a>(
        &'a self,
        command: &'a str,
        on_line: LineSink<'a>,
    ) -> BoxFuture<'a, Result<i32, ShellError>> {
        Box::pin(async move {
            run_streaming(&self.su_binary, &["-c", command], on_line, self.drain_timeout).await
        })
    }

    fn run_plain<'a>(
        &'a self,
        program: &'a str,
        args: &'a [&'a str],
    ) -> BoxFuture<'a, Result<i32, ShellError>> {
        Box::pin(async move {
            let quiet = |_: OutputLine| {};
            run_streaming(program, args, &quiet, self.drain_timeout).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::StreamKind;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_has_root_with_working_shell() {
        assert!(SuShell::new("sh").has_root().await);
    }

    #[tokio::test]
    async fn test_has_root_false_when_binary_missing() {
        assert!(!SuShell::new("/nonexistent/su").has_root().await);
    }

    #[tokio::test]
    async fn test_run_privileged_wraps_in_dash_c() {
        let shell = SuShell::new("sh");
        let lines = Mutex::new(Vec::new());
        let sink = |l: OutputLine| lines.lock().unwrap().push(l);
        let code = shell
            .run_privileged("echo hello && exit 4", &sink)
            .await
            .unwrap();
        assert_eq!(code, 4);
        assert_eq!(
            lines.into_inner().unwrap(),
            vec![OutputLine { kind: StreamKind::Stdout, text: "hello".into() }]
        );
    }

    #[test]
    fn test_kernel_override() {
        let shell = SuShell::default().with_kernel_release(Some("4.19.191-perf".into()));
        assert_eq!(shell.kernel_release(), "4.19.191-perf");
        assert_eq!(shell.su_binary(), "su");
    }
}
