//! Backup retention
//!
//! Groups the artifacts in the backup directory by (kind, subject), keeps
//! the newest N of each group and deletes the rest. Files that do not
//! decode as artifacts are never touched or counted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::{ArtifactKind, BackupArtifact};
use crate::error::{TenbackError, TenbackResult};

/// Which retention groups a trim run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimScope {
    /// Only groups belonging to this tenant (its database artifacts and the
    /// addons artifacts derived from it)
    Own(String),
    /// Every subject present in the backup directory
    All,
}

impl TrimScope {
    fn selects(&self, subject: &str) -> bool {
        match self {
            TrimScope::All => true,
            // addons subjects are "<tenant>_<folder>"
            TrimScope::Own(own) => {
                subject == own || subject.strip_prefix(own.as_str()).is_some_and(|rest| rest.starts_with('_'))
            }
        }
    }
}

/// List the decodable artifacts in a backup directory, sorted by filename
pub fn list_artifacts(backup_dir: &Path) -> TenbackResult<Vec<BackupArtifact>> {
    if !backup_dir.exists() {
        return Ok(Vec::new());
    }

    let mut artifacts = Vec::new();
    for entry in fs::read_dir(backup_dir).map_err(|e| {
        TenbackError::Filesystem(format!("cannot read {}: {}", backup_dir.display(), e))
    })? {
        let entry = entry
            .map_err(|e| TenbackError::Filesystem(format!("cannot read entry: {}", e)))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(artifact) = BackupArtifact::from_path(&entry.path()) {
            artifacts.push(artifact);
        }
    }
    artifacts.sort_by(|a, b| a.name.encode().cmp(&b.name.encode()));
    Ok(artifacts)
}

/// Apply the keep-last-N policy and delete the excess artifacts.
///
/// Within each selected group, artifacts are ordered by stamp and all but
/// the newest `keep` are deleted. Deletion order across groups is
/// lexicographic by filename; every deletion is announced before it
/// happens, and a file already removed by a concurrent run is tolerated.
/// Returns the removed paths.
pub fn trim(backup_dir: &Path, keep: usize, scope: &TrimScope) -> TenbackResult<Vec<PathBuf>> {
    let mut groups: BTreeMap<(ArtifactKind, String), Vec<BackupArtifact>> = BTreeMap::new();
    for artifact in list_artifacts(backup_dir)? {
        if scope.selects(&artifact.name.subject) {
            groups
                .entry((artifact.name.kind, artifact.name.subject.clone()))
                .or_default()
                .push(artifact);
        }
    }

    let mut doomed = Vec::new();
    for (_key, mut group) in groups {
        group.sort_by(|a, b| a.name.stamp.cmp(&b.name.stamp));
        let excess = group.len().saturating_sub(keep);
        doomed.extend(group.drain(..excess));
    }
    doomed.sort_by(|a, b| a.name.encode().cmp(&b.name.encode()));

    let mut removed = Vec::new();
    for artifact in doomed {
        println!("rm -f {}", artifact.path.display());
        if artifact.path.exists() {
            fs::remove_file(&artifact.path).map_err(|e| {
                TenbackError::Filesystem(format!(
                    "cannot remove {}: {}",
                    artifact.path.display(),
                    e
                ))
            })?;
            removed.push(artifact.path);
        }
    }
    Ok(removed)
}
