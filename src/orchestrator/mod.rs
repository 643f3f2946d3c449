//! Driver orchestration: the install and reset sequences.
//!
//! Install: root check -> family lookup -> kernel detect -> script match ->
//! stage -> privileged execute -> interpret exit code -> persist/cleanup.
//!
//! Reset: root check -> uninstall notices -> clear status -> reboot.
//!
//! Every step appends one line to the [`TerminalLog`]; a failing step ends the
//! sequence. Nothing propagates out as an error: every outcome is an
//! [`InstallResult`] or [`ResetResult`]. The persisted status changes only on
//! a definitive result. One operation runs at a time per orchestrator; a
//! second caller gets an immediate error instead of overlapping the first.

pub mod executor;
pub mod state;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

pub use executor::{execute_driver_script, reboot_device, shell_quote, ScriptRun};
pub use state::{OperationState, OrchestrationState};

use crate::config::{AppConfig, StatusStore};
use crate::error::SequenceError;
use crate::kernel::{self, match_driver_script, AssetStore};
use crate::models::{driver_folder, InstallResult, OperationKind, ResetResult};
use crate::system::SystemWrapper;
use crate::terminal::TerminalLog;
use crate::{log_info, log_parsed};

/// Clears the busy flag when an operation ends, however it ends.
struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs install and reset sequences against a privileged shell.
#[derive(Clone)]
pub struct DriverOrchestrator {
    system: Arc<dyn SystemWrapper>,
    assets: AssetStore,
    store: Arc<StatusStore>,
    terminal: TerminalLog,

    /// Single writer, observed by UI controllers
    state: Arc<watch::Sender<OrchestrationState>>,
    busy: Arc<AtomicBool>,

    /// Where scripts are staged before execution
    cache_dir: PathBuf,
    reboot_delay_secs: u64,
}

impl DriverOrchestrator {
    pub fn new(
        system: Arc<dyn SystemWrapper>,
        assets: AssetStore,
        store: Arc<StatusStore>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        let (state_tx, _) = watch::channel(OrchestrationState::default());
        DriverOrchestrator {
            system,
            assets,
            store,
            terminal: TerminalLog::new(),
            state: Arc::new(state_tx),
            busy: Arc::new(AtomicBool::new(false)),
            cache_dir: cache_dir.into(),
            reboot_delay_secs: 3,
        }
    }

    /// Build from application config.
    pub fn from_config(config: &AppConfig, system: Arc<dyn SystemWrapper>, store: Arc<StatusStore>) -> Self {
        DriverOrchestrator::new(
            system,
            AssetStore::new(&config.assets_dir),
            store,
            &config.cache_dir,
        )
        .with_reboot_delay(config.reboot_delay_secs)
    }

    pub fn with_reboot_delay(mut self, secs: u64) -> Self {
        self.reboot_delay_secs = secs;
        self
    }

    pub fn terminal(&self) -> &TerminalLog {
        &self.terminal
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn system(&self) -> &dyn SystemWrapper {
        self.system.as_ref()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrchestrationState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> OperationState {
        self.state.borrow().state.clone()
    }

    /// Duration of the current or last operation.
    pub fn last_elapsed(&self) -> Option<std::time::Duration> {
        self.state.borrow().elapsed()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Return a finished operation to `Idle`.
    pub fn acknowledge(&self) -> Result<(), SequenceError> {
        self.transition(OperationState::Idle)
    }

    pub fn kernel_version(&self) -> String {
        self.system.kernel_release()
    }

    pub fn is_compatible(&self) -> bool {
        kernel::matcher::is_compatible(&self.kernel_version())
    }

    /// Scripts shipped for a driver, sorted. Empty for unmapped drivers.
    pub fn available_scripts(&self, driver: &str) -> Vec<String> {
        driver_folder(driver)
            .map(|folder| self.assets.list(folder))
            .unwrap_or_default()
    }

    /// Script the matcher would pick for this device's kernel.
    pub fn recommended_script(&self, driver: &str) -> Option<String> {
        let folder = driver_folder(driver)?;
        let probe = self.assets.probe(folder);
        match_driver_script(&self.kernel_version(), &probe)
    }

    fn transition(&self, next: OperationState) -> Result<(), SequenceError> {
        let mut result = Ok(());
        self.state.send_if_modified(|s| match s.transition_to(next) {
            Ok(()) => true,
            Err(e) => {
                result = Err(e);
                false
            }
        });
        result
    }

    fn begin(&self, kind: OperationKind) -> Result<BusyGuard, SequenceError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("[Orchestrator] Rejected {}: another operation is running", kind);
            return Err(SequenceError::Busy);
        }
        let guard = BusyGuard {
            flag: Arc::clone(&self.busy),
        };
        self.transition(OperationState::Running(kind))?;
        self.terminal.clear();
        log_parsed!("Driver {} started", kind);
        Ok(guard)
    }

    fn finish(&self, kind: OperationKind, failure: Option<String>) {
        let next = match failure {
            None => {
                log_parsed!("Driver {} succeeded", kind);
                OperationState::Succeeded(kind)
            }
            Some(message) => {
                log_parsed!("Driver {} failed: {}", kind, message);
                OperationState::Failed { kind, message }
            }
        };
        if let Err(e) = self.transition(next) {
            log::error!("[Orchestrator] {}", e);
        }
    }

    /// Install `driver` for the running kernel.
    pub async fn install(&self, driver: &str) -> InstallResult {
        let _guard = match self.begin(OperationKind::Install) {
            Ok(guard) => guard,
            Err(e) => return InstallResult::Error(e.to_string()),
        };

        let result = self.run_install(driver).await;
        let failure = match &result {
            InstallResult::Success => None,
            InstallResult::Error(message) => Some(message.clone()),
        };
        self.finish(OperationKind::Install, failure);
        result
    }

    async fn run_install(&self, driver: &str) -> InstallResult {
        let log = &self.terminal;
        log.info("Starting driver installation...");

        if !self.system.has_root().await {
            log.error("Root permission check failed");
            return InstallResult::Error(
                "Installing a driver requires root permission. Grant root access and try again."
                    .to_string(),
            );
        }
        log.success("Root permission check passed");

        let Some(folder) = driver_folder(driver) else {
            log.error(format!("Driver '{}' is not available yet", driver));
            return InstallResult::Error(format!(
                "The selected driver '{}' is not ready yet, please choose another driver.",
                driver
            ));
        };
        log.info(format!("Selected driver: {} -> folder: {}", driver, folder));

        let kernel_version = self.system.kernel_release();
        log.info(format!("Detected kernel version: {}", kernel_version));

        let probe = self.assets.probe(folder);
        let Some(script) = match_driver_script(&kernel_version, &probe) else {
            log.error("No matching driver file found");
            return InstallResult::Error(format!(
                "Unsupported kernel: no driver file found for kernel {} in '{}'.",
                kernel_version, folder
            ));
        };

        let staged = match self.assets.stage(folder, &script, &self.cache_dir) {
            Ok(path) => path,
            Err(e) => {
                log.error(format!("Failed to prepare driver file: {}", e));
                return InstallResult::Error(format!("Installation error: {}", e));
            }
        };
        log.info(format!("Selected driver file: {}", script));
        log.success("Driver file prepared");
        log_info!("[Orchestrator] Staged {} at {}", script, staged.display());

        let run = execute_driver_script(self.system.as_ref(), &staged, &kernel_version, log).await;
        remove_staged(&staged);

        match run {
            ScriptRun::Exited(0) => {
                if let Err(e) = self.store.record_install(driver) {
                    log.error(format!("Failed to save driver status: {}", e));
                    return InstallResult::Error(format!(
                        "The driver script succeeded but its status could not be saved: {}",
                        e
                    ));
                }
                log.success("Driver installed successfully");
                InstallResult::Success
            }
            ScriptRun::Exited(code) => {
                log.error("Driver installation failed");
                InstallResult::Error(format!(
                    "Driver installation failed with exit code {}. Check the log and try again.",
                    code
                ))
            }
            ScriptRun::NotExecutable => {
                log.error("Driver installation failed");
                InstallResult::Error(
                    "Driver installation failed: the prepared driver file is not executable."
                        .to_string(),
                )
            }
            ScriptRun::Failed(e) => InstallResult::Error(format!("Installation error: {}", e)),
        }
    }

    /// Uninstall the driver: clear the persisted status and reboot.
    pub async fn reset(&self) -> ResetResult {
        let _guard = match self.begin(OperationKind::Reset) {
            Ok(guard) => guard,
            Err(e) => return ResetResult::Error(e.to_string()),
        };

        let result = self.run_reset().await;
        let failure = match &result {
            ResetResult::Success => None,
            ResetResult::NoRootPermission => Some("Root permission check failed".to_string()),
            ResetResult::RebootFailed => Some("Device reboot failed".to_string()),
            ResetResult::Error(message) => Some(message.clone()),
        };
        self.finish(OperationKind::Reset, failure);
        result
    }

    async fn run_reset(&self) -> ResetResult {
        let log = &self.terminal;

        if !self.system.has_root().await {
            log.error("Root permission check failed");
            return ResetResult::NoRootPermission;
        }
        log.success("Root permission check passed");

        if !self.store.is_driver_installed() {
            log.warning("No driver is installed, nothing to reset");
            return ResetResult::Error("No driver is installed".to_string());
        }

        log.info("Starting terminal reset mode...");
        log.progress("Uninstalling driver...");
        log.success("Driver uninstalled");

        if let Err(e) = self.store.reset() {
            log.error(format!("Failed to reset driver status: {}", e));
            return ResetResult::Error(format!("Reset failed: {}", e));
        }
        log.success("Driver status reset");
        log.info("Preparing to reboot device");

        if !reboot_device(self.system.as_ref(), self.reboot_delay_secs, log).await {
            log.error("Device reboot failed");
            return ResetResult::RebootFailed;
        }
        ResetResult::Success
    }
}

fn remove_staged(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("[Orchestrator] Failed to remove {}: {}", path.display(), e);
        }
    }
}
