//! Named connections.
//!
//! [`ConnectionRegistry`] is an ordinary value: build it at startup, configure it
//! once, then pass it (or `&mut` to it) to whatever needs connection lookup.
//!
//! Connections can be configured in code or loaded from TOML:
//!
//! ```toml
//! [[connection]]
//! name = "main"
//! host = "db.local"
//! login = "app"
//! password = "secret"
//! database = "shop"
//! timeout = 300
//! default = true
//!
//! [[connection]]
//! name = "reports"
//! host = "replica.local"
//! login = "ro"
//! password = "secret"
//! database = "shop"
//! charset = "latin1"
//! ```

use crate::connection::{Connection, ConnectionConfig};
use crate::driver::Driver;
use crate::error::{DbError, DbResult};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// One connection entry as it appears in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSettings {
    pub name: String,
    pub host: String,
    pub login: String,
    pub password: String,
    pub database: String,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub default: bool,
}

impl ConnectionSettings {
    pub fn to_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(
            self.host.as_str(),
            self.login.as_str(),
            self.password.as_str(),
            self.database.as_str(),
        );
        if let Some(charset) = &self.charset {
            config = config.charset(charset.as_str());
        }
        if let Some(timeout) = self.timeout {
            config = config.timeout(timeout);
        }
        config
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default, rename = "connection")]
    connections: Vec<ConnectionSettings>,
}

/// Name → connection lookup with an optional default.
pub struct ConnectionRegistry {
    driver: Arc<dyn Driver>,
    connections: IndexMap<String, Connection>,
    default: Option<String>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("driver", &self.driver.name())
            .field("connections", &self.connections.keys().collect::<Vec<_>>())
            .field("default", &self.default)
            .finish()
    }
}

impl ConnectionRegistry {
    /// Empty registry; connections it configures use `driver`.
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            connections: IndexMap::new(),
            default: None,
        }
    }

    /// Empty registry using the bundled SQLite driver.
    #[cfg(feature = "sqlite")]
    pub fn sqlite() -> Self {
        Self::new(Arc::new(crate::driver::SqliteDriver))
    }

    /// Registry configured from a TOML document.
    pub fn from_toml_str(driver: Arc<dyn Driver>, toml_src: &str) -> DbResult<Self> {
        let mut registry = Self::new(driver);
        registry.load_toml_str(toml_src)?;
        Ok(registry)
    }

    /// Registry configured from a TOML file.
    pub fn from_toml_file(driver: Arc<dyn Driver>, path: impl AsRef<Path>) -> DbResult<Self> {
        let mut registry = Self::new(driver);
        registry.load_toml_file(path)?;
        Ok(registry)
    }

    /// Add (or replace) a connection. With `is_default` it also becomes the default.
    pub fn configure(
        &mut self,
        name: impl Into<String>,
        config: ConnectionConfig,
        is_default: bool,
    ) -> DbResult<()> {
        let connection = Connection::new(config, Arc::clone(&self.driver));
        self.insert(name, connection, is_default)
    }

    /// Register an already built connection (e.g. one using a different driver).
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        connection: Connection,
        is_default: bool,
    ) -> DbResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DbError::Config("connection name cannot be empty".into()));
        }
        tracing::debug!(
            target: "sqlplate.registry",
            name = %name,
            host = %connection.config().host,
            database = %connection.config().database,
            is_default,
            "configured connection"
        );
        if is_default {
            self.default = Some(name.clone());
        }
        self.connections.insert(name, connection);
        Ok(())
    }

    pub fn configure_settings(&mut self, settings: ConnectionSettings) -> DbResult<()> {
        let config = settings.to_config();
        self.configure(settings.name, config, settings.default)
    }

    pub fn configure_many(
        &mut self,
        settings: impl IntoIterator<Item = ConnectionSettings>,
    ) -> DbResult<()> {
        for s in settings {
            self.configure_settings(s)?;
        }
        Ok(())
    }

    /// Configure every `[[connection]]` entry of a TOML document.
    pub fn load_toml_str(&mut self, toml_src: &str) -> DbResult<()> {
        let file: SettingsFile = toml::from_str(toml_src).map_err(|e| {
            DbError::Config(format!("failed to parse connection settings: {e}"))
        })?;
        self.configure_many(file.connections)
    }

    /// Configure every `[[connection]]` entry of a TOML file.
    pub fn load_toml_file(&mut self, path: impl AsRef<Path>) -> DbResult<()> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DbError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        self.load_toml_str(&raw)
    }

    /// Look up a connection; `None` means the default one.
    pub fn get(&mut self, name: Option<&str>) -> DbResult<&mut Connection> {
        let name = match name {
            Some(name) => name,
            None => self
                .default
                .as_deref()
                .ok_or_else(|| DbError::NotConfigured("no default connection".into()))?,
        };
        self.connections
            .get_mut(name)
            .ok_or_else(|| DbError::NotConfigured(format!("no connection named '{name}'")))
    }

    /// The default connection.
    pub fn default_connection(&mut self) -> DbResult<&mut Connection> {
        self.get(None)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Configured names, in configuration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    /// Close every open session.
    pub fn close_all(&mut self) {
        for connection in self.connections.values_mut() {
            connection.close();
        }
    }
}
