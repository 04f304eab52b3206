//! tenback - backup, restore and retention for Odoo-style tenant databases
//!
//! This library backs up a tenant's PostgreSQL database, its attachment
//! store and its addon directories as one artifact set, restores those
//! artifacts, and enforces a keep-last-N retention policy over the backup
//! directory. External tools (pg_dump, psql, tar) do the heavy lifting;
//! this crate owns the sequencing, naming and failure propagation around
//! them.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: configuration file parsing and path resolution
//! - `error`: custom error types
//! - `artifact`: the artifact filename codec
//! - `exec`: external tool execution (single and piped)
//! - `staging`: staging directory lifecycle and filestore snapshots
//! - `db`: PostgreSQL administration and post-restore sanitization
//! - `backup`: the backup, restore and retention pipelines
//! - `cli`: command handlers

pub mod artifact;
pub mod backup;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod exec;
pub mod staging;

pub use error::{TenbackError, TenbackResult};
