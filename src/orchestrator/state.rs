//! Operation state tracking for the install/reset sequencer.
//!
//! - `OperationState`: Idle -> Running -> {Succeeded, Failed}
//! - `OrchestrationState`: the published snapshot (state + timestamps + last error)
//!
//! `Running` is the only state that rejects a new operation. A finished
//! operation may go back to `Idle` (user retry/acknowledge) or start the next
//! operation directly.

use crate::error::SequenceError;
use crate::models::OperationKind;
use std::fmt;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Running(OperationKind),
    Succeeded(OperationKind),
    Failed { kind: OperationKind, message: String },
}

impl OperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::Idle => "idle",
            OperationState::Running(_) => "running",
            OperationState::Succeeded(_) => "succeeded",
            OperationState::Failed { .. } => "failed",
        }
    }

    pub fn kind(&self) -> Option<OperationKind> {
        match self {
            OperationState::Idle => None,
            OperationState::Running(k) | OperationState::Succeeded(k) => Some(*k),
            OperationState::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, OperationState::Running(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Succeeded(_) | OperationState::Failed { .. })
    }

    /// Check if a transition to `next` is valid.
    pub fn can_transition_to(&self, next: &OperationState) -> bool {
        match (self, next) {
            (OperationState::Running(current), OperationState::Succeeded(k)) => current == k,
            (OperationState::Running(current), OperationState::Failed { kind, .. }) => current == kind,
            (OperationState::Running(_), _) => false,
            (_, OperationState::Running(_)) => true,
            (OperationState::Succeeded(_), OperationState::Idle)
            | (OperationState::Failed { .. }, OperationState::Idle) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Idle => write!(f, "idle"),
            OperationState::Running(k) => write!(f, "{} running", k),
            OperationState::Succeeded(k) => write!(f, "{} succeeded", k),
            OperationState::Failed { kind, message } => write!(f, "{} failed: {}", kind, message),
        }
    }
}

/// Snapshot published to observers.
#[derive(Debug, Clone)]
pub struct OrchestrationState {
    pub state: OperationState,
    /// When the current or last operation started
    pub started_at: Option<SystemTime>,
    pub last_update_time: SystemTime,
}

impl Default for OrchestrationState {
    fn default() -> Self {
        OrchestrationState {
            state: OperationState::Idle,
            started_at: None,
            last_update_time: SystemTime::now(),
        }
    }
}

impl OrchestrationState {
    /// Attempt to transition to the next state.
    pub fn transition_to(&mut self, next: OperationState) -> Result<(), SequenceError> {
        if !self.state.can_transition_to(&next) {
            return Err(SequenceError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        let now = SystemTime::now();
        if next.is_running() {
            self.started_at = Some(now);
        }
        self.state = next;
        self.last_update_time = now;
        Ok(())
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            OperationState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Running time of the current operation, or the duration of the last
    /// one once it has finished.
    pub fn elapsed(&self) -> Option<Duration> {
        let started = self.started_at?;
        let end = if self.state.is_running() {
            SystemTime::now()
        } else {
            self.last_update_time
        };
        end.duration_since(started).ok()
    }
}
