//! UI module: screen controllers and terminal rendering.
//!
//! Controllers hold the state a front end displays and publish it through
//! `watch` channels. The command-line binary is the only front end; it drives
//! the controllers and renders with [`render`].

pub mod controller;
pub mod dashboard;
pub mod render;

pub use controller::{DriverController, DriverUiState, TerminalDialog};
pub use dashboard::{DashboardController, DashboardState};
