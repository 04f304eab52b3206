//! Backup, restore and retention pipelines

pub mod dump;
pub mod manifest;
pub mod restore;
pub mod trim;

pub use dump::BackupPipeline;
pub use manifest::{Manifest, Release};
pub use restore::RestorePipeline;
pub use trim::{list_artifacts, trim, TrimScope};
