//! Process settings from the environment. The server binary may seed it from `.env` first.

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Settings {
    /// Server URL. Its database is the admin database used to list the others.
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub metadata_dir: PathBuf,
    /// Schema introspected and addressed in every database.
    pub catalog_schema: String,
    /// Database served by the single-database routes (`/:table`).
    pub default_database: Option<String>,
    pub max_connections: u32,
    pub introspect_on_startup: bool,
    pub persist_partial_snapshots: bool,
    pub body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/postgres".into(),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            metadata_dir: PathBuf::from("metadata"),
            catalog_schema: "public".into(),
            default_database: None,
            max_connections: 5,
            introspect_on_startup: true,
            persist_partial_snapshots: false,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

fn parsed<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: format!("'{}': {}", raw, e),
    })
}

fn flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            reason: format!("'{}' is not a boolean", raw),
        }),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut s = Settings::default();
        if let Some(v) = lookup("DATABASE_URL") {
            s.database_url = v;
        }
        if let Some(v) = lookup("LISTEN_ADDR") {
            s.listen_addr = parsed("LISTEN_ADDR", &v)?;
        }
        if let Some(v) = lookup("METADATA_DIR") {
            s.metadata_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CATALOG_SCHEMA") {
            if v.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    name: "CATALOG_SCHEMA",
                    reason: "must not be empty".into(),
                });
            }
            s.catalog_schema = v.trim().to_string();
        }
        if let Some(v) = lookup("DEFAULT_DATABASE").filter(|v| !v.trim().is_empty()) {
            let v = v.trim().to_string();
            crate::sql::check_identifier(&v)?;
            s.default_database = Some(v);
        }
        if let Some(v) = lookup("MAX_CONNECTIONS") {
            s.max_connections = parsed("MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("INTROSPECT_ON_STARTUP") {
            s.introspect_on_startup = flag("INTROSPECT_ON_STARTUP", &v)?;
        }
        if let Some(v) = lookup("PERSIST_PARTIAL_SNAPSHOTS") {
            s.persist_partial_snapshots = flag("PERSIST_PARTIAL_SNAPSHOTS", &v)?;
        }
        if let Some(v) = lookup("BODY_LIMIT_BYTES") {
            s.body_limit_bytes = parsed("BODY_LIMIT_BYTES", &v)?;
        }
        Ok(s)
    }
}
