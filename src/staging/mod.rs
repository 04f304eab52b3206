//! Staging directory management
//!
//! A backup assembles its pieces (dump, manifest, filestore snapshot) in a
//! staging directory next to the destination artifact. The directory is
//! owned by exactly one pipeline invocation and is removed on every exit
//! path, success or failure.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{TenbackError, TenbackResult};

/// An exclusively-owned staging directory, removed recursively on drop
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    armed: bool,
}

impl StagingDir {
    /// Create the staging directory `<parent>/<name>`.
    ///
    /// Creation is exclusive: an already-present directory means the caller
    /// reused a creation-order prefix and is an error, never silently
    /// adopted.
    pub fn create(parent: &Path, name: &str) -> TenbackResult<Self> {
        fs::create_dir_all(parent).map_err(|e| {
            TenbackError::Filesystem(format!("cannot create {}: {}", parent.display(), e))
        })?;

        let path = parent.join(name);
        fs::create_dir(&path).map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                TenbackError::Filesystem(format!(
                    "staging directory {} already exists",
                    path.display()
                ))
            } else {
                TenbackError::Filesystem(format!("cannot create {}: {}", path.display(), e))
            }
        })?;

        Ok(Self { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staging directory, reporting failures. The drop handler
    /// covers early-exit paths where this is never reached.
    pub fn close(mut self) -> TenbackResult<()> {
        self.armed = false;
        fs::remove_dir_all(&self.path).map_err(|e| {
            TenbackError::Filesystem(format!("cannot remove {}: {}", self.path.display(), e))
        })
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

/// Snapshot the attachment store into the staging directory.
///
/// Prefers a symbolic link; the archiver dereferences it later, so the
/// staging directory never holds a physical copy when the platform allows
/// linking. A missing source is not an error (fresh database, no
/// attachments yet).
pub fn snapshot_filestore(src: &Path, dst: &Path) -> TenbackResult<()> {
    if !src.exists() {
        return Ok(());
    }
    // absolute target, so the link resolves regardless of where the staging
    // directory sits
    let src = src.canonicalize().map_err(|e| {
        TenbackError::Filesystem(format!("cannot resolve {}: {}", src.display(), e))
    })?;

    #[cfg(unix)]
    {
        if std::os::unix::fs::symlink(&src, dst).is_ok() {
            return Ok(());
        }
    }

    copy_dir_all(&src, dst)
}

/// Recursively empty a directory without removing it, creating it when
/// absent.
pub fn remove_contents(dir: &Path) -> TenbackResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            TenbackError::Filesystem(format!("cannot create {}: {}", dir.display(), e))
        })?;
        return Ok(());
    }

    for entry in fs::read_dir(dir).map_err(|e| {
        TenbackError::Filesystem(format!("cannot read {}: {}", dir.display(), e))
    })? {
        let entry = entry
            .map_err(|e| TenbackError::Filesystem(format!("cannot read entry: {}", e)))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| {
            TenbackError::Filesystem(format!("cannot stat {}: {}", path.display(), e))
        })?;
        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| {
            TenbackError::Filesystem(format!("cannot remove {}: {}", path.display(), e))
        })?;
    }
    Ok(())
}

/// Recursive directory copy, the fallback when linking is unavailable
pub fn copy_dir_all(src: &Path, dst: &Path) -> TenbackResult<()> {
    fs::create_dir_all(dst).map_err(|e| {
        TenbackError::Filesystem(format!("cannot create {}: {}", dst.display(), e))
    })?;
    for entry in fs::read_dir(src).map_err(|e| {
        TenbackError::Filesystem(format!("cannot read {}: {}", src.display(), e))
    })? {
        let entry = entry
            .map_err(|e| TenbackError::Filesystem(format!("cannot read entry: {}", e)))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| {
            TenbackError::Filesystem(format!("cannot stat {}: {}", from.display(), e))
        })?;
        if file_type.is_dir() {
            copy_dir_all(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| {
                TenbackError::Filesystem(format!(
                    "cannot copy {} to {}: {}",
                    from.display(),
                    to.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}
