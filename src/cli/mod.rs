//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the pipeline layer.

pub mod backup;
pub mod trim;

pub use backup::{handle_backup_command, handle_restore_command};
pub use trim::{handle_list_command, handle_trim_command};
