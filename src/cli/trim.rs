//! Retention and listing CLI commands

use crate::artifact::ArtifactKind;
use crate::backup::{list_artifacts, trim, TrimScope};
use crate::config::{ProjectPaths, Settings};
use crate::error::TenbackResult;

/// Trim old backups: only the configured tenant's groups, or every subject
/// found in the backup directory when `all` is set.
pub fn handle_trim_command(
    settings: &Settings,
    paths: &ProjectPaths,
    keep: usize,
    all: bool,
) -> TenbackResult<()> {
    let scope = if all {
        TrimScope::All
    } else {
        TrimScope::Own(settings.db_name.clone())
    };

    let removed = trim(paths.backup_dir(), keep, &scope)?;
    if removed.is_empty() {
        println!("Nothing to trim (keep-count {}).", keep);
    } else {
        println!("Deleted {} backup(s).", removed.len());
    }
    Ok(())
}

/// List the artifacts in the backup directory
pub fn handle_list_command(paths: &ProjectPaths) -> TenbackResult<()> {
    let artifacts = list_artifacts(paths.backup_dir())?;
    if artifacts.is_empty() {
        println!("No backups found in {}.", paths.backup_dir().display());
        return Ok(());
    }

    let (databases, addons): (Vec<_>, Vec<_>) = artifacts
        .into_iter()
        .partition(|a| a.name.kind == ArtifactKind::Database);

    if !databases.is_empty() {
        println!("Database backups:");
        for artifact in &databases {
            println!("  {}", artifact.name.encode());
        }
    }
    if !addons.is_empty() {
        println!("Addon backups:");
        for artifact in &addons {
            println!("  {}", artifact.name.encode());
        }
    }
    Ok(())
}
