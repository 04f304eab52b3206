//! Dump manifest
//!
//! Every database artifact embeds a `manifest.json` describing what was
//! dumped: subject name, product version, server version and the installed
//! modules. It is written once at backup time and only read back for
//! information at restore time; nothing gates on it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use postgres::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::settings::parse_config_file;
use crate::db;
use crate::error::{TenbackError, TenbackResult};

/// Metadata embedded in a database artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Dump format marker, always "1"
    pub odoo_dump: String,
    pub db_name: String,
    pub version: String,
    pub version_info: Vec<Value>,
    pub major_version: String,
    pub pg_version: String,
    /// Installed module names with their versions
    pub modules: BTreeMap<String, String>,
}

impl Manifest {
    /// Gather the manifest from a live connection to the dumped database
    pub fn collect(client: &mut Client, db_name: &str, release: &Release) -> TenbackResult<Self> {
        Ok(Self {
            odoo_dump: "1".to_string(),
            db_name: db_name.to_string(),
            version: release.version.clone(),
            version_info: release.version_info.clone(),
            major_version: release.major_version.clone(),
            pg_version: db::server_version(client)?,
            modules: db::installed_modules(client)?,
        })
    }

    pub fn write_to(&self, path: &Path) -> TenbackResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            TenbackError::Filesystem(format!("cannot write {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    pub fn from_slice(bytes: &[u8]) -> TenbackResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Product version info, parsed from a release.py-style file
#[derive(Debug, Clone)]
pub struct Release {
    pub version: String,
    pub version_info: Vec<Value>,
    pub major_version: String,
}

impl Default for Release {
    fn default() -> Self {
        Self {
            version: "0.0".to_string(),
            version_info: vec![
                Value::from(0),
                Value::from(0),
                Value::from(0),
                Value::from("final"),
                Value::from(0),
                Value::from(""),
            ],
            major_version: "0.0".to_string(),
        }
    }
}

impl Release {
    /// Parse the `version_info` tuple out of a release file, e.g.
    /// `version_info = (17, 0, 0, FINAL, 0, '')`
    pub fn from_file(path: &Path) -> TenbackResult<Self> {
        let raw = parse_config_file(path)?;
        let tuple = raw
            .get("version_info")
            .ok_or_else(|| {
                TenbackError::Config(format!("no version_info in {}", path.display()))
            })?;

        let inner = tuple
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let version_info: Vec<Value> = inner
            .split(',')
            .map(|part| {
                let part = part.trim().trim_matches('\'').trim_matches('"');
                match part.parse::<i64>() {
                    Ok(n) => Value::from(n),
                    Err(_) => Value::from(part),
                }
            })
            .collect();

        if version_info.len() < 2 {
            return Err(TenbackError::Config(format!(
                "malformed version_info in {}",
                path.display()
            )));
        }

        let major_version = format!(
            "{}.{}",
            segment(&version_info[0]),
            segment(&version_info[1])
        );
        Ok(Self {
            version: major_version.clone(),
            version_info,
            major_version,
        })
    }

    /// Load from an optional configured path; parse failures fall back to
    /// placeholder values so a missing release file never blocks a backup.
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Release::from_file(path).unwrap_or_else(|e| {
                warn!(file = %path.display(), error = %e, "cannot parse release file");
                Release::default()
            }),
            None => Release::default(),
        }
    }
}

fn segment(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
