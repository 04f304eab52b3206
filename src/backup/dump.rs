//! Backup pipeline
//!
//! Produces one database artifact (dump + manifest + filestore snapshot,
//! archived together) and one artifact per non-empty addon directory. Every
//! step is a hard failure point; the staging directory is removed on all
//! exit paths.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::artifact::{self, ArtifactName, SEPARATOR};
use crate::backup::manifest::{Manifest, Release};
use crate::config::{ProjectPaths, Settings};
use crate::db::ConnectParams;
use crate::error::TenbackResult;
use crate::exec::{self, Cmd};
use crate::staging::{self, StagingDir};

/// Compressor handed to tar; level 19 is the highest zstd offers without
/// the ultra flags
const ARCHIVER: &str = "zstd -19";

/// Produces backup artifacts for one tenant
pub struct BackupPipeline<'a> {
    settings: &'a Settings,
    paths: &'a ProjectPaths,
}

impl<'a> BackupPipeline<'a> {
    pub fn new(settings: &'a Settings, paths: &'a ProjectPaths) -> Self {
        Self { settings, paths }
    }

    /// Back up the database and filestore under the given creation-order
    /// prefix. Returns the artifact path.
    ///
    /// The prefix must be new: a staging directory left over from a
    /// previous run with the same prefix fails the pipeline immediately.
    pub fn dump_database(&self, prefix: &str) -> TenbackResult<PathBuf> {
        let db_name = &self.settings.db_name;
        let backup_dir = self.paths.backup_dir();
        let file_name = ArtifactName::database(prefix, db_name).encode();
        let artifact_path = backup_dir.join(&file_name);

        let staging = StagingDir::create(backup_dir, &format!("{}{}{}", prefix, SEPARATOR, db_name))?;
        info!(db = %db_name, staging = %staging.path().display(), "backup started");

        // database dump
        let dump = Cmd::new("pg_dump")
            .arg("-h")
            .arg(&self.settings.db_host)
            .arg("-p")
            .arg(self.settings.db_port.to_string())
            .arg("-U")
            .arg(&self.settings.db_user)
            .arg("--no-owner")
            .arg("--file")
            .arg(staging.path().join("dump.sql").to_string_lossy())
            .arg(db_name)
            .env("PGPASSWORD", &self.settings.db_password);
        exec::run(&dump, "dump")?;
        info!(db = %db_name, "database dumped");

        // manifest, from one live connection
        let mut client = ConnectParams::from_settings(self.settings).connect()?;
        let release = Release::load(self.settings.release_file.as_deref());
        let manifest = Manifest::collect(&mut client, db_name, &release)?;
        manifest.write_to(&staging.path().join("manifest.json"))?;

        // filestore snapshot
        staging::snapshot_filestore(
            &self.paths.filestore(db_name),
            &staging.path().join("filestore"),
        )?;

        // archive the staging contents; --dereference materializes the
        // filestore link into the artifact
        let tar = Cmd::new("tar")
            .arg("--dereference")
            .args(["--use-compress-program", ARCHIVER])
            .arg("-cf")
            .arg(artifact_path.to_string_lossy())
            .arg("-C")
            .arg(staging.path().to_string_lossy())
            .arg(".");
        exec::run(&tar, "archive")?;

        staging.close()?;
        info!(artifact = %artifact_path.display(), "backup complete");
        Ok(artifact_path)
    }

    /// Back up every non-empty addon directory under the same prefix.
    /// Empty or missing directories are skipped, not errors.
    pub fn dump_addons(&self, prefix: &str) -> TenbackResult<Vec<PathBuf>> {
        let db_name = &self.settings.db_name;
        let backup_dir = self.paths.backup_dir();
        fs::create_dir_all(backup_dir)?;

        let mut produced = Vec::new();
        for dir in self.paths.addon_dirs() {
            if !has_entries(dir) {
                debug!(dir = %dir.display(), "addon directory empty, skipped");
                continue;
            }

            let folder = self.paths.addon_folder(dir);
            let subject = artifact::addon_subject(db_name, &folder);
            let artifact_path = backup_dir.join(ArtifactName::addons(prefix, subject).encode());

            let tar = Cmd::new("tar")
                .arg("--dereference")
                .args(["--use-compress-program", ARCHIVER])
                .arg("-cf")
                .arg(artifact_path.to_string_lossy())
                .arg("-C")
                .arg(dir.to_string_lossy())
                .arg(".");
            exec::run(&tar, "addons archive")?;

            info!(artifact = %artifact_path.display(), "addons backed up");
            produced.push(artifact_path);
        }
        Ok(produced)
    }
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
