//! Backup and restore CLI commands

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::artifact::{ArtifactKind, ArtifactName};
use crate::backup::{BackupPipeline, RestorePipeline};
use crate::config::{ProjectPaths, Settings};
use crate::error::{TenbackError, TenbackResult};

/// Back up the database, filestore and addon directories under one
/// creation-order prefix.
pub fn handle_backup_command(settings: &Settings, paths: &ProjectPaths) -> TenbackResult<()> {
    let prefix = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let pipeline = BackupPipeline::new(settings, paths);

    let database = pipeline.dump_database(&prefix)?;
    println!("odoo: {}", database.display());

    for addons in pipeline.dump_addons(&prefix)? {
        println!("addons: {}", addons.display());
    }
    Ok(())
}

/// Restore one or more artifacts. Database artifacts rebuild the configured
/// database and filestore; addons artifacts repopulate their addon
/// directory (or `addons_to` when given).
pub fn handle_restore_command(
    settings: &Settings,
    paths: &ProjectPaths,
    files: &[String],
    copy: bool,
    addons_to: Option<&Path>,
) -> TenbackResult<()> {
    let pipeline = RestorePipeline::new(settings, paths);

    for file in files {
        let path = resolve_artifact_path(paths, file)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(ArtifactName::decode)
            .ok_or_else(|| {
                TenbackError::Config(format!("not a recognizable backup artifact: {}", file))
            })?;

        match name.kind {
            ArtifactKind::Database => {
                println!("restore from backup file {}", path.display());
                pipeline.restore_database(&path, copy)?;
            }
            ArtifactKind::Addons => {
                println!("restore from addon file {}", path.display());
                pipeline.restore_addons(&path, addons_to)?;
            }
        }
    }
    Ok(())
}

/// Resolve a restore argument: an existing path is taken as-is, a bare
/// filename is looked up in the backup directory.
fn resolve_artifact_path(paths: &ProjectPaths, file: &str) -> TenbackResult<PathBuf> {
    let path = PathBuf::from(file);
    if path.exists() {
        return Ok(path);
    }

    let in_backup_dir = paths.backup_dir().join(file);
    if in_backup_dir.exists() {
        return Ok(in_backup_dir);
    }

    Err(TenbackError::artifact_not_found(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn test_settings() -> Settings {
        Settings {
            db_host: "localhost".into(),
            db_port: 5432,
            db_name: "acme".into(),
            db_user: "odoo".into(),
            db_password: "secret".into(),
            db_template: "template0".into(),
            data_dir: "data".into(),
            addons_path: vec!["addons".into()],
            backup_dir: "backups".into(),
            release_file: None,
        }
    }

    #[test]
    fn test_resolve_artifact_path_prefers_existing_path() {
        let temp = TempDir::new().unwrap();
        let settings = test_settings();
        let paths = ProjectPaths::new(temp.path(), &settings);

        let direct = temp.path().join("20240101_000000__acme.tar.zst");
        fs::write(&direct, b"").unwrap();
        assert_eq!(
            resolve_artifact_path(&paths, &direct.to_string_lossy()).unwrap(),
            direct
        );
    }

    #[test]
    fn test_resolve_artifact_path_falls_back_to_backup_dir() {
        let temp = TempDir::new().unwrap();
        let settings = test_settings();
        let paths = ProjectPaths::new(temp.path(), &settings);

        fs::create_dir_all(paths.backup_dir()).unwrap();
        let stored = paths.backup_dir().join("20240101_000000__acme.tar.zst");
        fs::write(&stored, b"").unwrap();

        assert_eq!(
            resolve_artifact_path(&paths, "20240101_000000__acme.tar.zst").unwrap(),
            stored
        );
    }

    #[test]
    fn test_resolve_artifact_path_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let settings = test_settings();
        let paths = ProjectPaths::new(temp.path(), &settings);

        let err = resolve_artifact_path(&paths, "absent.tar.zst").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_restore_rejects_undecodable_filename() {
        let temp = TempDir::new().unwrap();
        let settings = test_settings();
        let paths = ProjectPaths::new(temp.path(), &settings);

        let stray = temp.path().join("dump.sql");
        fs::write(&stray, b"").unwrap();

        let err = handle_restore_command(
            &settings,
            &paths,
            &[stray.to_string_lossy().into_owned()],
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TenbackError::Config(_)));
    }
}
