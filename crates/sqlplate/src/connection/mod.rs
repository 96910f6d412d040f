//! Lazily connected database handle.
//!
//! A [`Connection`] owns at most one driver session. The session is opened on the
//! first statement (or by an explicit [`Connection::connect`]) and dropped by
//! [`Connection::close`]; the next statement reconnects.
//!
//! Statements with parameters go through the template parser; statements without
//! parameters are passed to the driver untouched.
//!
//! # Example
//!
//! ```ignore
//! use sqlplate::{Connection, ConnectionConfig, params};
//!
//! let mut db = Connection::sqlite(ConnectionConfig::sqlite("app.db"));
//! let id = db.insert(
//!     "INSERT INTO :name :set",
//!     params!["users", serde_json::json!({"name": "ann"})],
//! )?;
//! let name = db.select_one("SELECT name FROM users WHERE id = :i", params![id])?;
//! ```
//!
//! A `Connection` is not meant to be shared between threads; use one per worker.

mod config;

#[cfg(test)]
mod tests;

pub use config::ConnectionConfig;

use crate::driver::{BindType, Driver, Session};
use crate::error::DbResult;
use crate::parser::parse;
use crate::row::{Cursor, FromRow, Row, RowKey};
use crate::value::{Param, Value};
use indexmap::IndexMap;
use std::sync::Arc;

const MAX_LOGGED_SQL: usize = 200;

/// A database connection with lazy session management.
pub struct Connection {
    config: ConnectionConfig,
    driver: Arc<dyn Driver>,
    session: Option<Box<dyn Session>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("driver", &self.driver.name())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Connection {
    /// Create a connection; nothing is opened until the first statement.
    pub fn new(config: ConnectionConfig, driver: Arc<dyn Driver>) -> Self {
        Self {
            config,
            driver,
            session: None,
        }
    }

    /// Connection backed by the bundled SQLite driver.
    #[cfg(feature = "sqlite")]
    pub fn sqlite(config: ConnectionConfig) -> Self {
        Self::new(config, Arc::new(crate::driver::SqliteDriver))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Open a fresh session, replacing any existing one, and apply the idle timeout
    /// if one is configured.
    pub fn connect(&mut self) -> DbResult<()> {
        self.close();
        let session = self.open()?;
        self.session = Some(session);
        Ok(())
    }

    /// Drop the session. The next statement reconnects.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            tracing::info!(
                target: "sqlplate.connection",
                host = %self.config.host,
                database = %self.config.database,
                "closed"
            );
        }
    }

    fn open(&self) -> DbResult<Box<dyn Session>> {
        let mut session = self.driver.connect(&self.config)?;
        tracing::info!(
            target: "sqlplate.connection",
            driver = self.driver.name(),
            host = %self.config.host,
            database = %self.config.database,
            charset = %self.config.charset,
            "connected"
        );

        if let Some(seconds) = self.config.idle_timeout() {
            if let Some(stmt) = session.idle_timeout_statement(seconds) {
                tracing::debug!(target: "sqlplate.sql", sql = %stmt, "idle timeout");
                session.query(&stmt)?;
            }
        }
        Ok(session)
    }

    fn session(&mut self) -> DbResult<&mut Box<dyn Session>> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.open()?,
        };
        Ok(self.session.insert(session))
    }

    /// Run a statement and return its cursor.
    ///
    /// With no parameters `template` is sent to the driver as-is. Otherwise it is
    /// expanded first and every value is bound with an inferred [`BindType`].
    pub fn query(&mut self, template: &str, params: Vec<Param>) -> DbResult<Cursor> {
        if params.is_empty() {
            tracing::debug!(target: "sqlplate.sql", sql = %truncate_sql(template), "query");
            return self.session()?.query(template);
        }

        let (sql, values) = parse(template, params)?.into_parts();
        tracing::debug!(
            target: "sqlplate.sql",
            sql = %truncate_sql(&sql),
            binds = values.len(),
            "query"
        );

        let session = self.session()?;
        let mut stmt = session.prepare(&sql)?;
        for (i, value) in values.iter().enumerate() {
            let bind_type = BindType::infer(value);
            tracing::trace!(target: "sqlplate.sql", position = i + 1, ?bind_type, "bind");
            stmt.bind(i + 1, value, bind_type)?;
        }
        stmt.execute()
    }

    /// All rows.
    pub fn select(&mut self, template: &str, params: Vec<Param>) -> DbResult<Vec<Row>> {
        Ok(self.query(template, params)?.fetch_all())
    }

    /// All rows mapped to `T`.
    pub fn select_as<T: FromRow>(
        &mut self,
        template: &str,
        params: Vec<Param>,
    ) -> DbResult<Vec<T>> {
        self.select(template, params)?
            .iter()
            .map(T::from_row)
            .collect()
    }

    /// First row, if any.
    pub fn select_row(&mut self, template: &str, params: Vec<Param>) -> DbResult<Option<Row>> {
        Ok(self.query(template, params)?.fetch())
    }

    /// First row mapped to `T`, if any.
    pub fn select_row_as<T: FromRow>(
        &mut self,
        template: &str,
        params: Vec<Param>,
    ) -> DbResult<Option<T>> {
        self.select_row(template, params)?
            .as_ref()
            .map(T::from_row)
            .transpose()
    }

    /// First column of the first row, if any.
    pub fn select_one(&mut self, template: &str, params: Vec<Param>) -> DbResult<Option<Value>> {
        Ok(self.query(template, params)?.fetch_column())
    }

    /// First column → second column, over all rows.
    pub fn select_key_pair(
        &mut self,
        template: &str,
        params: Vec<Param>,
    ) -> DbResult<IndexMap<RowKey, Value>> {
        self.query(template, params)?.fetch_key_pair()
    }

    /// Rows grouped by the value of their first column.
    pub fn select_group(
        &mut self,
        template: &str,
        params: Vec<Param>,
    ) -> DbResult<IndexMap<RowKey, Vec<Row>>> {
        Ok(self.query(template, params)?.fetch_group())
    }

    /// First column of every row.
    pub fn select_column(&mut self, template: &str, params: Vec<Param>) -> DbResult<Vec<Value>> {
        Ok(self.query(template, params)?.fetch_column_all())
    }

    /// Run an `UPDATE`; returns the number of affected rows.
    pub fn update(&mut self, template: &str, params: Vec<Param>) -> DbResult<u64> {
        Ok(self.query(template, params)?.row_count())
    }

    /// Run a `DELETE`; returns the number of affected rows.
    pub fn delete(&mut self, template: &str, params: Vec<Param>) -> DbResult<u64> {
        Ok(self.query(template, params)?.row_count())
    }

    /// Run an `INSERT`; returns the generated identifier.
    pub fn insert(&mut self, template: &str, params: Vec<Param>) -> DbResult<i64> {
        self.query(template, params)?;
        self.last_insert_id()
    }

    /// Identifier generated by the most recent insert on this connection.
    pub fn last_insert_id(&mut self) -> DbResult<i64> {
        self.session()?.last_insert_id()
    }
}

/// Truncate SQL for log output, on a char boundary.
fn truncate_sql(sql: &str) -> String {
    if sql.len() <= MAX_LOGGED_SQL {
        return sql.to_string();
    }
    let mut end = MAX_LOGGED_SQL;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}
