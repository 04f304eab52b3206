//! PostgreSQL administration
//!
//! Drop/create of the target database and the queries the manifest needs.
//! Connection parameters are an explicit value handed to every caller; there
//! is no process-wide database handle.

pub mod neutralize;

use std::collections::BTreeMap;

use postgres::{Client, NoTls};

use crate::config::Settings;
use crate::error::{TenbackError, TenbackResult};

/// Connection parameters for one database
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl ConnectParams {
    /// Parameters for the configured tenant database
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            host: settings.db_host.clone(),
            port: settings.db_port,
            user: settings.db_user.clone(),
            password: settings.db_password.clone(),
            dbname: settings.db_name.clone(),
        }
    }

    /// Same server, connected to the `postgres` maintenance database.
    /// Database-altering statements cannot run on the database they target.
    pub fn maintenance(&self) -> Self {
        Self {
            dbname: "postgres".to_string(),
            ..self.clone()
        }
    }

    pub fn connect(&self) -> TenbackResult<Client> {
        postgres::Config::new()
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(&self.dbname)
            .connect(NoTls)
            .map_err(|e| {
                TenbackError::Database(format!(
                    "cannot connect to {} at {}:{}: {}",
                    self.dbname, self.host, self.port, e
                ))
            })
    }
}

/// Quote an SQL identifier
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Terminate other sessions on `name`, then drop it if present.
///
/// Dropping a database that does not exist is not an error.
pub fn drop_database(admin: &ConnectParams, name: &str) -> TenbackResult<()> {
    let mut client = admin.connect()?;
    client.execute(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = $1 AND pid <> pg_backend_pid()",
        &[&name],
    )?;
    client.batch_execute(&format!("DROP DATABASE IF EXISTS {}", quote_ident(name)))?;
    Ok(())
}

/// Create `name` from the configured template.
///
/// Probes `pg_database` first: a hit means the database came into existence
/// since the drop and is surfaced as [`TenbackError::DatabaseExists`] rather
/// than silently overwritten.
pub fn create_database(admin: &ConnectParams, name: &str, template: &str) -> TenbackResult<()> {
    let mut client = admin.connect()?;
    if database_exists(&mut client, name)? {
        return Err(TenbackError::DatabaseExists(name.to_string()));
    }

    // 'C' collate is only safe with template0
    let collate = if template == "template0" {
        " LC_COLLATE 'C'"
    } else {
        ""
    };
    client.batch_execute(&format!(
        "CREATE DATABASE {} ENCODING 'unicode'{} TEMPLATE {}",
        quote_ident(name),
        collate,
        quote_ident(template)
    ))?;
    Ok(())
}

pub fn database_exists(client: &mut Client, name: &str) -> TenbackResult<bool> {
    let rows = client.query(
        "SELECT datname FROM pg_database WHERE datname = $1",
        &[&name],
    )?;
    Ok(!rows.is_empty())
}

/// The server version string, e.g. "16.2"
pub fn server_version(client: &mut Client) -> TenbackResult<String> {
    let row = client.query_one("SHOW server_version", &[])?;
    let version: String = row.get(0);
    Ok(version.trim().to_string())
}

/// Installed module names with their versions
pub fn installed_modules(client: &mut Client) -> TenbackResult<BTreeMap<String, String>> {
    let rows = client.query(
        "SELECT name, latest_version FROM ir_module_module WHERE state = 'installed'",
        &[],
    )?;
    let mut modules = BTreeMap::new();
    for row in rows {
        let name: String = row.get(0);
        let version: Option<String> = row.get(1);
        modules.insert(name, version.unwrap_or_default());
    }
    Ok(modules)
}
