//! Development stand-in for the superuser shell.
//!
//! Grants root, pretends every command succeeds after a short pause and
//! echoes what it would have run. Nothing is executed.

use super::{LineSink, OutputLine, StreamKind, SystemWrapper};
use crate::error::ShellError;
use futures::future::BoxFuture;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SimulatedShell {
    kernel_release: String,
    step_delay: Duration,
}

impl SimulatedShell {
    pub fn new(kernel_release: impl Into<String>) -> Self {
        SimulatedShell {
            kernel_release: kernel_release.into(),
            step_delay: Duration::from_millis(300),
        }
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }
}

impl SystemWrapper for SimulatedShell {
    fn has_root(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            tokio::time::sleep(self.step_delay).await;
            true
        })
    }

    fn kernel_release(&self) -> String {
        self.kernel_release.clone()
    }

    fn run_privileged<'a>(
        &'a self,
        command: &'a str,
        on_line: LineSink<'a>,
    ) -> BoxFuture<'a, Result<i32, ShellError>> {
        Box::pin(async move {
            log::info!("[SimulatedShell] Would run: {}", command);
            on_line(OutputLine {
                kind: StreamKind::Stdout,
                text: format!("[simulated] {}", command),
            });
            tokio::time::sleep(self.step_delay).await;
            Ok(0)
        })
    }

    fn run_plain<'a>(
        &'a self,
        program: &'a str,
        args: &'a [&'a str],
    ) -> BoxFuture<'a, Result<i32, ShellError>> {
        Box::pin(async move {
            log::info!("[SimulatedShell] Would run: {} {:?}", program, args);
            Ok(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_simulated_always_succeeds() {
        let shell = SimulatedShell::new("5.10.43").with_step_delay(Duration::ZERO);
        assert!(shell.has_root().await);
        assert_eq!(shell.kernel_release(), "5.10.43");

        let lines = Mutex::new(Vec::new());
        let sink = |l: OutputLine| lines.lock().unwrap().push(l.text);
        assert_eq!(shell.run_privileged("reboot", &sink).await.unwrap(), 0);
        assert_eq!(lines.into_inner().unwrap(), vec!["[simulated] reboot".to_string()]);
        assert_eq!(shell.run_plain("reboot", &[]).await.unwrap(), 0);
    }
}
