//! Kernel Driver Script Module
//!
//! Handles everything that ties a running kernel to a driver script:
//! - Kernel release matching against the per-family script table
//! - The on-disk asset store the scripts are shipped in

pub mod assets;
pub mod matcher;

pub use assets::{AssetStore, FolderProbe};
pub use matcher::{match_driver_script, AssetProbe, KernelVersion};
