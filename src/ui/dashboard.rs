//! Dashboard controller: device information sections.

use crate::system::info::{self, InfoSection};
use crate::system::SystemWrapper;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    pub loading: bool,
    pub sections: Vec<InfoSection>,
    pub error: Option<String>,
}

impl DashboardState {
    pub fn section(&self, title: &str) -> Option<&InfoSection> {
        self.sections.iter().find(|s| s.title == title)
    }
}

#[derive(Clone)]
pub struct DashboardController {
    system: Arc<dyn SystemWrapper>,
    state: Arc<watch::Sender<DashboardState>>,
}

impl DashboardController {
    pub fn new(system: Arc<dyn SystemWrapper>) -> Self {
        let (tx, _) = watch::channel(DashboardState::default());
        DashboardController {
            system,
            state: Arc::new(tx),
        }
    }

    pub fn get_state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Reload all sections. Lookups degrade to placeholders, so this only
    /// reports an error when nothing at all could be collected.
    pub async fn refresh(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let sections = info::load_all(self.system.as_ref()).await;
        let error = if sections.iter().all(|s| s.entries.is_empty()) {
            Some("Failed to load system information".to_string())
        } else {
            None
        };

        self.state.send_replace(DashboardState {
            loading: false,
            sections,
            error,
        });
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }
}
