//! Driver screen controller.
//!
//! Owns the driver screen's [`DriverUiState`] and the terminal dialog flags.
//! Both are published through `watch` channels; the controller is their only
//! writer. Privileged work is delegated to the [`DriverOrchestrator`].

use crate::error::SequenceError;
use crate::models::{InstallResult, ResetResult, DEFAULT_DRIVER};
use crate::orchestrator::DriverOrchestrator;
use std::sync::Arc;
use tokio::sync::watch;

pub const ROOT_REQUIRED_INSTALL: &str =
    "Installing a driver requires root permission. Grant root access and try again.";
pub const ROOT_REQUIRED_RESET: &str =
    "The device is not rooted, cannot reboot. Grant root access and try again.";
pub const REBOOT_FAILED: &str =
    "Driver status was reset but the reboot command failed. Please reboot the device manually.";
pub const RESET_NOT_CONFIRMED: &str = "Reset was not confirmed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverUiState {
    Initial { installed: bool, selected: String },
    Installing { selected: String },
    InstallSuccess { driver: String },
    InstallFailure { message: String, selected: String },
    Resetting { driver: String },
    ResetSuccess { selected: String },
    ResetFailure { message: String, driver: String },
    ShowConfirmDialog { driver: String },
}

impl Default for DriverUiState {
    fn default() -> Self {
        DriverUiState::Initial {
            installed: false,
            selected: DEFAULT_DRIVER.to_string(),
        }
    }
}

impl DriverUiState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DriverUiState::Installing { .. } | DriverUiState::Resetting { .. })
    }

    pub fn is_driver_installed(&self) -> bool {
        match self {
            DriverUiState::Initial { installed, .. } => *installed,
            DriverUiState::Installing { .. }
            | DriverUiState::InstallFailure { .. }
            | DriverUiState::ResetSuccess { .. } => false,
            DriverUiState::InstallSuccess { .. }
            | DriverUiState::Resetting { .. }
            | DriverUiState::ResetFailure { .. }
            | DriverUiState::ShowConfirmDialog { .. } => true,
        }
    }

    pub fn selected_driver(&self) -> &str {
        match self {
            DriverUiState::Initial { selected, .. }
            | DriverUiState::Installing { selected }
            | DriverUiState::InstallFailure { selected, .. }
            | DriverUiState::ResetSuccess { selected } => selected,
            DriverUiState::InstallSuccess { driver }
            | DriverUiState::Resetting { driver }
            | DriverUiState::ResetFailure { driver, .. }
            | DriverUiState::ShowConfirmDialog { driver } => driver,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            DriverUiState::InstallFailure { message, .. }
            | DriverUiState::ResetFailure { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn shows_confirm_dialog(&self) -> bool {
        matches!(self, DriverUiState::ShowConfirmDialog { .. })
    }
}

/// Terminal log dialog visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminalDialog {
    pub visible: bool,
    /// The operation shown in the dialog has finished
    pub completed: bool,
}

#[derive(Clone)]
pub struct DriverController {
    orchestrator: DriverOrchestrator,
    state: Arc<watch::Sender<DriverUiState>>,
    dialog: Arc<watch::Sender<TerminalDialog>>,
}

impl DriverController {
    /// Create the controller with its state loaded from the status store.
    pub fn new(orchestrator: DriverOrchestrator) -> Self {
        let (state_tx, _) = watch::channel(DriverUiState::default());
        let (dialog_tx, _) = watch::channel(TerminalDialog::default());
        let controller = DriverController {
            orchestrator,
            state: Arc::new(state_tx),
            dialog: Arc::new(dialog_tx),
        };
        controller.refresh_status();
        controller
    }

    pub fn orchestrator(&self) -> &DriverOrchestrator {
        &self.orchestrator
    }

    pub fn get_state(&self) -> DriverUiState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DriverUiState> {
        self.state.subscribe()
    }

    pub fn terminal_dialog(&self) -> TerminalDialog {
        *self.dialog.borrow()
    }

    pub fn subscribe_dialog(&self) -> watch::Receiver<TerminalDialog> {
        self.dialog.subscribe()
    }

    fn set_state(&self, next: DriverUiState) {
        log::debug!("[Controller] {:?}", next);
        self.state.send_replace(next);
    }

    /// Re-read installed flag and selected driver from the store.
    pub fn refresh_status(&self) {
        let store = self.orchestrator.store();
        let next = if store.is_driver_installed() {
            DriverUiState::InstallSuccess {
                driver: store.selected_driver(),
            }
        } else {
            DriverUiState::Initial {
                installed: false,
                selected: store.selected_driver(),
            }
        };
        self.set_state(next);
    }

    /// Change the selected driver. Ignored while an operation runs or a
    /// driver is installed; returns whether the selection was applied.
    pub fn select_driver(&self, name: &str) -> bool {
        let current = self.get_state();
        if current.is_loading() || current.is_driver_installed() {
            return false;
        }
        let next = match current {
            DriverUiState::Initial { installed, .. } => DriverUiState::Initial {
                installed,
                selected: name.to_string(),
            },
            DriverUiState::InstallFailure { message, .. } => DriverUiState::InstallFailure {
                message,
                selected: name.to_string(),
            },
            _ => return false,
        };
        if let Err(e) = self.orchestrator.store().set_selected_driver(name) {
            log::warn!("[Controller] Failed to persist selected driver: {}", e);
        }
        self.set_state(next);
        true
    }

    fn show_terminal(&self) {
        self.dialog.send_replace(TerminalDialog {
            visible: true,
            completed: false,
        });
    }

    fn complete_terminal(&self) {
        self.dialog.send_modify(|d| d.completed = true);
    }

    /// Install the selected driver. Refused without touching the screen
    /// state while another operation is in progress.
    pub async fn install(&self) -> InstallResult {
        let current = self.get_state();
        if current.is_loading() {
            return InstallResult::Error(SequenceError::Busy.to_string());
        }
        let selected = current.selected_driver().to_string();

        if !self.orchestrator.system().has_root().await {
            self.set_state(DriverUiState::InstallFailure {
                message: ROOT_REQUIRED_INSTALL.to_string(),
                selected,
            });
            return InstallResult::Error(ROOT_REQUIRED_INSTALL.to_string());
        }

        self.show_terminal();
        self.set_state(DriverUiState::Installing {
            selected: selected.clone(),
        });

        let result = self.orchestrator.install(&selected).await;
        let next = match &result {
            InstallResult::Success => DriverUiState::InstallSuccess { driver: selected },
            InstallResult::Error(message) => DriverUiState::InstallFailure {
                message: message.clone(),
                selected,
            },
        };
        self.set_state(next);
        self.complete_terminal();
        result
    }

    /// Ask for confirmation before resetting. Without root the request fails
    /// immediately.
    pub async fn request_reset(&self) {
        let current = self.get_state();
        if current.is_loading() {
            return;
        }
        if !self.orchestrator.system().has_root().await {
            self.set_state(DriverUiState::ResetFailure {
                message: ROOT_REQUIRED_RESET.to_string(),
                driver: current.selected_driver().to_string(),
            });
            return;
        }
        if current.is_driver_installed() {
            self.set_state(DriverUiState::ShowConfirmDialog {
                driver: current.selected_driver().to_string(),
            });
        }
    }

    pub fn dismiss_confirm(&self) {
        if let DriverUiState::ShowConfirmDialog { driver } = self.get_state() {
            self.set_state(DriverUiState::InstallSuccess { driver });
        }
    }

    /// Run the reset sequence. Only valid from the confirmation dialog.
    pub async fn confirm_reset(&self) -> ResetResult {
        let driver = match self.get_state() {
            DriverUiState::ShowConfirmDialog { driver } => driver,
            current if current.is_loading() => {
                return ResetResult::Error(SequenceError::Busy.to_string())
            }
            _ => return ResetResult::Error(RESET_NOT_CONFIRMED.to_string()),
        };
        self.show_terminal();
        self.set_state(DriverUiState::Resetting {
            driver: driver.clone(),
        });

        let result = self.orchestrator.reset().await;
        let next = match &result {
            ResetResult::Success => DriverUiState::ResetSuccess {
                selected: DEFAULT_DRIVER.to_string(),
            },
            ResetResult::NoRootPermission => DriverUiState::ResetFailure {
                message: ROOT_REQUIRED_RESET.to_string(),
                driver,
            },
            ResetResult::RebootFailed => DriverUiState::ResetFailure {
                message: REBOOT_FAILED.to_string(),
                driver,
            },
            ResetResult::Error(message) => DriverUiState::ResetFailure {
                message: message.clone(),
                driver,
            },
        };
        self.set_state(next);
        self.complete_terminal();
        result
    }

    /// Leave a failure or a finished reset and return to a fresh state.
    pub fn retry(&self) {
        match self.get_state() {
            DriverUiState::InstallFailure { selected, .. } => {
                self.set_state(DriverUiState::Initial {
                    installed: false,
                    selected,
                });
            }
            DriverUiState::ResetFailure { .. } => self.refresh_status(),
            DriverUiState::ResetSuccess { .. } => {
                self.set_state(DriverUiState::Initial {
                    installed: false,
                    selected: DEFAULT_DRIVER.to_string(),
                });
            }
            _ => {}
        }
        if self.orchestrator.current_state().is_terminal() {
            if let Err(e) = self.orchestrator.acknowledge() {
                log::debug!("[Controller] {}", e);
            }
        }
    }

    /// Dismiss the error banner.
    pub fn clear_error(&self) {
        self.retry();
    }

    /// Hide the terminal dialog and drop its log.
    pub fn dismiss_terminal(&self) {
        self.dialog.send_replace(TerminalDialog::default());
        self.orchestrator.terminal().clear();
    }
}
