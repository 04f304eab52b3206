//! Path management
//!
//! Resolves the directories a pipeline touches against the project root:
//! backup store, data directory, per-database filestore, addon directories.

use std::path::{Path, PathBuf};

use super::settings::Settings;

/// All paths used by the pipelines, resolved against one project root
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
    backup_dir: PathBuf,
    data_dir: PathBuf,
    addon_dirs: Vec<PathBuf>,
}

impl ProjectPaths {
    /// Resolve the configured paths against a project root
    pub fn new(root: impl Into<PathBuf>, settings: &Settings) -> Self {
        let root = root.into();
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };

        Self {
            backup_dir: resolve(&settings.backup_dir),
            data_dir: resolve(&settings.data_dir),
            addon_dirs: settings.addons_path.iter().map(|p| resolve(p)).collect(),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The attachment store for one database: `<data_dir>/filestore/<db>`
    pub fn filestore(&self, db_name: &str) -> PathBuf {
        self.data_dir.join("filestore").join(db_name)
    }

    /// Addon directories eligible for backup
    pub fn addon_dirs(&self) -> &[PathBuf] {
        &self.addon_dirs
    }

    /// An addon directory's path relative to the project root, used to name
    /// its artifacts. Falls back to the final component for paths outside
    /// the root.
    pub fn addon_folder(&self, dir: &Path) -> String {
        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
        let folder = relative.to_string_lossy();
        if relative.is_absolute() || folder.is_empty() {
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| folder.into_owned())
        } else {
            folder.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Settings;

    fn test_settings() -> Settings {
        Settings {
            db_host: "localhost".into(),
            db_port: 5432,
            db_name: "acme".into(),
            db_user: "odoo".into(),
            db_password: "secret".into(),
            db_template: "template0".into(),
            data_dir: "data".into(),
            addons_path: vec!["addons".into(), "/opt/shared/themes".into()],
            backup_dir: "backups".into(),
            release_file: None,
        }
    }

    #[test]
    fn test_relative_paths_resolve_against_root() {
        let paths = ProjectPaths::new("/srv/acme", &test_settings());

        assert_eq!(paths.root(), Path::new("/srv/acme"));
        assert_eq!(paths.backup_dir(), Path::new("/srv/acme/backups"));
        assert_eq!(paths.data_dir(), Path::new("/srv/acme/data"));
        assert_eq!(
            paths.filestore("acme"),
            PathBuf::from("/srv/acme/data/filestore/acme")
        );
    }

    #[test]
    fn test_absolute_paths_kept() {
        let paths = ProjectPaths::new("/srv/acme", &test_settings());
        assert_eq!(paths.addon_dirs()[1], Path::new("/opt/shared/themes"));
    }

    #[test]
    fn test_addon_folder() {
        let paths = ProjectPaths::new("/srv/acme", &test_settings());

        assert_eq!(paths.addon_folder(Path::new("/srv/acme/addons")), "addons");
        assert_eq!(
            paths.addon_folder(Path::new("/srv/acme/custom/themes")),
            "custom/themes"
        );
        // outside the root: final component only
        assert_eq!(
            paths.addon_folder(Path::new("/opt/shared/themes")),
            "themes"
        );
    }
}
