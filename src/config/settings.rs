//! Tenant configuration
//!
//! Reads the odoo.conf-style configuration file: line-oriented `key = value`
//! text with `[section]` headers and `#`/`;` comments. Only the keys the
//! pipelines need are extracted; everything else is ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{TenbackError, TenbackResult};

/// Connection and layout settings for one tenant
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_template: String,
    /// Root of the tenant data directory; the filestore lives under it
    pub data_dir: PathBuf,
    /// Addon directories eligible for backup
    pub addons_path: Vec<PathBuf>,
    /// Where artifacts are written and trimmed; relative to the project root
    pub backup_dir: PathBuf,
    /// Optional release.py-style file supplying product version info
    pub release_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from a configuration file
    pub fn load(path: &Path) -> TenbackResult<Self> {
        let raw = parse_config_file(path)?;

        let addons_path = required(&raw, "addons_path")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();

        Ok(Self {
            db_host: required(&raw, "db_host")?.to_string(),
            db_port: parse_port(required(&raw, "db_port")?)?,
            db_name: required(&raw, "db_name")?.to_string(),
            db_user: required(&raw, "db_user")?.to_string(),
            db_password: required(&raw, "db_password")?.to_string(),
            db_template: required(&raw, "db_template")?.to_string(),
            data_dir: PathBuf::from(required(&raw, "data_dir")?),
            addons_path,
            backup_dir: raw
                .get("backup_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("backups")),
            release_file: raw.get("release_file").map(PathBuf::from),
        })
    }
}

fn required<'a>(raw: &'a BTreeMap<String, String>, key: &str) -> TenbackResult<&'a str> {
    raw.get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TenbackError::Config(format!("missing required key '{}'", key)))
}

fn parse_port(value: &str) -> TenbackResult<u16> {
    value
        .parse()
        .map_err(|_| TenbackError::Config(format!("invalid db_port '{}'", value)))
}

/// Parse a `key = value` file into a map. Later occurrences of a key win.
///
/// Also used for release.py-style version files, which share the shape.
pub fn parse_config_file(path: &Path) -> TenbackResult<BTreeMap<String, String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        TenbackError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;

    let mut raw = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            raw.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONF: &str = "\
[options]
# database
db_host = localhost
db_port = 5432
db_name = acme
db_user = odoo
db_password = secret
db_template = template0
data_dir = data
addons_path = odoo/addons, addons
";

    fn write_conf(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_settings() {
        let file = write_conf(CONF);
        let settings = Settings::load(file.path()).unwrap();

        assert_eq!(settings.db_host, "localhost");
        assert_eq!(settings.db_port, 5432);
        assert_eq!(settings.db_name, "acme");
        assert_eq!(settings.db_template, "template0");
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(
            settings.addons_path,
            vec![PathBuf::from("odoo/addons"), PathBuf::from("addons")]
        );
        assert_eq!(settings.backup_dir, PathBuf::from("backups"));
        assert!(settings.release_file.is_none());
    }

    #[test]
    fn test_backup_dir_override() {
        let file = write_conf(&format!("{}backup_dir = /srv/backups\n", CONF));
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.backup_dir, PathBuf::from("/srv/backups"));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let file = write_conf("db_host = localhost\n");
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, TenbackError::Config(_)));
        assert!(err.to_string().contains("db_port"));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let file = write_conf(&CONF.replace("5432", "not-a-port"));
        let err = Settings::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("db_port"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Settings::load(Path::new("/nonexistent/odoo.conf")).unwrap_err();
        assert!(matches!(err, TenbackError::Config(_)));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let file = write_conf(&format!("{}db_name = beta\n", CONF));
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.db_name, "beta");
    }
}
