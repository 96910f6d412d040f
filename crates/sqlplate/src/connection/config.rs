use serde::{Deserialize, Serialize};
use std::fmt;

fn default_charset() -> String {
    "UTF8".to_string()
}

/// Connection parameters. Immutable once handed to a [`Connection`](super::Connection).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub login: String,
    pub password: String,
    /// Database name (for SQLite, the database file path).
    pub database: String,
    /// Character set requested for the session.
    #[serde(default = "default_charset")]
    pub charset: String,
    /// Server-side idle timeout in seconds, applied right after connecting.
    #[serde(default)]
    pub timeout: Option<u32>,
}

impl ConnectionConfig {
    /// Create a configuration with the default `UTF8` charset and no idle timeout.
    pub fn new(
        host: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            login: login.into(),
            password: password.into(),
            database: database.into(),
            charset: default_charset(),
            timeout: None,
        }
    }

    /// SQLite database at `path` (`:memory:` for an in-memory database).
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::new("localhost", "", "", path)
    }

    /// Set the session character set.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Set the idle timeout. `0` disables it.
    pub fn timeout(mut self, seconds: u32) -> Self {
        self.timeout = (seconds > 0).then_some(seconds);
        self
    }

    /// Idle timeout to apply on connect, if any.
    pub fn idle_timeout(&self) -> Option<u32> {
        self.timeout.filter(|s| *s > 0)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("login", &self.login)
            .field("password", &"***")
            .field("database", &self.database)
            .field("charset", &self.charset)
            .field("timeout", &self.timeout)
            .finish()
    }
}
