//! Restore pipeline
//!
//! Rebuilds the database and filestore from a database artifact, or an addon
//! directory from an addons artifact. Steps are strictly sequential; every
//! step other than the neutralization set is fatal on failure. There is no
//! rollback: a failure after the drop leaves the target database absent,
//! which is the accepted risk window.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::artifact::{self, ArtifactKind, BackupArtifact};
use crate::backup::manifest::Manifest;
use crate::config::{ProjectPaths, Settings};
use crate::db::{self, neutralize, ConnectParams};
use crate::error::{TenbackError, TenbackResult};
use crate::exec::{self, Cmd};
use crate::staging;

/// Consumes backup artifacts for one tenant
pub struct RestorePipeline<'a> {
    settings: &'a Settings,
    paths: &'a ProjectPaths,
}

impl<'a> RestorePipeline<'a> {
    pub fn new(settings: &'a Settings, paths: &'a ProjectPaths) -> Self {
        Self { settings, paths }
    }

    /// Restore a database artifact over the configured database.
    ///
    /// `copy == true` treats the result as an independent copy: it gets a
    /// fresh identity UUID and loses the license binding, and the
    /// neutralization set does not run. `copy == false` preserves identity
    /// and runs the full neutralization set instead.
    pub fn restore_database(&self, source: &Path, copy: bool) -> TenbackResult<()> {
        let db_name = &self.settings.db_name;
        let params = ConnectParams::from_settings(self.settings);
        let admin = params.maintenance();

        self.report_manifest(source);

        info!(db = %db_name, "dropping target database");
        db::drop_database(&admin, db_name)?;

        info!(db = %db_name, template = %self.settings.db_template, "creating empty database");
        db::create_database(&admin, db_name, &self.settings.db_template)?;

        // stream the dump straight from the archive into psql, no temp file
        info!(db = %db_name, "restoring dump");
        let tar = Cmd::new("tar")
            .arg("Oaxf")
            .arg(source.to_string_lossy())
            .arg("./dump.sql");
        let psql = Cmd::new("psql")
            .arg("-h")
            .arg(&self.settings.db_host)
            .arg("-p")
            .arg(self.settings.db_port.to_string())
            .arg("-U")
            .arg(&self.settings.db_user)
            .arg("--dbname")
            .arg(db_name)
            .arg("-q")
            .env("PGPASSWORD", &self.settings.db_password);
        if let Err(err) = exec::run_piped(&tar, &psql, "restore dump") {
            // a partially loaded database must not survive the failure
            if let Err(drop_err) = db::drop_database(&admin, db_name) {
                warn!(db = %db_name, error = %drop_err, "cannot drop partially restored database");
            }
            return Err(err);
        }

        info!(db = %db_name, "restoring filestore");
        staging::remove_contents(self.paths.data_dir())?;
        let filestore = self.paths.filestore(db_name);
        fs::create_dir_all(&filestore).map_err(|e| {
            TenbackError::Filesystem(format!("cannot create {}: {}", filestore.display(), e))
        })?;
        let tar = Cmd::new("tar")
            .arg("axf")
            .arg(source.to_string_lossy())
            .arg("-C")
            .arg(filestore.to_string_lossy())
            .arg("--strip-components=2")
            .arg("./filestore");
        exec::run(&tar, "restore filestore")?;

        // post-processing on the freshly restored database
        let mut client = params.connect()?;
        if copy {
            info!(db = %db_name, "resetting database identity");
            neutralize::reset_identity(&mut client)?;
        } else {
            info!(db = %db_name, "neutralizing database");
            let outcomes = neutralize::run_all(&mut client);
            let failed = outcomes.iter().filter(|o| !o.ok()).count();
            info!(
                db = %db_name,
                steps = outcomes.len(),
                failed,
                "neutralization finished"
            );
        }

        info!(db = %db_name, "restore complete");
        Ok(())
    }

    /// Restore an addons artifact into its addon directory.
    ///
    /// The destination is derived from the artifact's encoded subject unless
    /// an explicit override is supplied. The destination is emptied, not
    /// removed, before extraction.
    pub fn restore_addons(&self, source: &Path, dest: Option<&Path>) -> TenbackResult<()> {
        let dest = match dest {
            Some(dir) => dir.to_path_buf(),
            None => self.derive_addons_destination(source)?,
        };

        info!(dest = %dest.display(), "restoring addons");
        staging::remove_contents(&dest)?;

        let tar = Cmd::new("tar")
            .arg("axf")
            .arg(source.to_string_lossy())
            .arg("-C")
            .arg(dest.to_string_lossy())
            .arg(".");
        exec::run(&tar, "restore addons")?;

        info!(dest = %dest.display(), "addons restored");
        Ok(())
    }

    fn derive_addons_destination(&self, source: &Path) -> TenbackResult<PathBuf> {
        let artifact = BackupArtifact::from_path(source)
            .filter(|a| a.name.kind == ArtifactKind::Addons)
            .ok_or_else(|| TenbackError::artifact_not_found(source.display().to_string()))?;
        let folder = artifact::addon_destination(&artifact.name.subject);
        Ok(self.paths.root().join(folder))
    }

    /// Best-effort peek at the embedded manifest, logged for the operator.
    /// The manifest never gates a restore.
    fn report_manifest(&self, source: &Path) {
        let tar = Cmd::new("tar")
            .arg("Oaxf")
            .arg(source.to_string_lossy())
            .arg("./manifest.json");
        match exec::run_capture(&tar, "read manifest").and_then(|b| Manifest::from_slice(&b)) {
            Ok(manifest) => info!(
                db = %manifest.db_name,
                version = %manifest.version,
                pg_version = %manifest.pg_version,
                modules = manifest.modules.len(),
                "artifact manifest"
            ),
            Err(e) => warn!(artifact = %source.display(), error = %e, "cannot read manifest"),
        }
    }
}
