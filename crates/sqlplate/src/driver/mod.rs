//! Driver boundary.
//!
//! A [`Driver`] opens [`Session`]s; a session prepares [`Statement`]s that take
//! positional binds (1-based) and execute into a materialized [`Cursor`].
//! Driver errors are surfaced as [`DbError::Driver`](crate::DbError::Driver) and are
//! never reinterpreted by the layers above.

use crate::connection::ConnectionConfig;
use crate::error::DbResult;
use crate::row::Cursor;
use crate::value::Value;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;

/// Type hint attached to each positional bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindType {
    Int,
    Null,
    Bool,
    Str,
}

impl BindType {
    /// Infer the bind type of a value.
    ///
    /// Anything numeric-looking binds as `Int`, including floats and numeric text
    /// such as `"3.5"`; drivers decide how to store the non-integral ones.
    pub fn infer(value: &Value) -> Self {
        if value.is_numeric() {
            BindType::Int
        } else {
            match value {
                Value::Null => BindType::Null,
                Value::Bool(_) => BindType::Bool,
                _ => BindType::Str,
            }
        }
    }
}

/// Opens sessions from a [`ConnectionConfig`].
pub trait Driver: Send + Sync {
    /// Short driver name for logs.
    fn name(&self) -> &'static str;

    fn connect(&self, config: &ConnectionConfig) -> DbResult<Box<dyn Session>>;
}

/// A live database session.
pub trait Session: Send {
    fn prepare<'s>(&'s mut self, sql: &str) -> DbResult<Box<dyn Statement + 's>>;

    /// Run SQL with no parameters.
    fn query(&mut self, sql: &str) -> DbResult<Cursor>;

    /// Identifier generated by the most recent insert on this session.
    fn last_insert_id(&self) -> DbResult<i64>;

    /// Session-scoped statement that sets the idle timeout, if the backend has one.
    fn idle_timeout_statement(&self, seconds: u32) -> Option<String> {
        Some(format!("SET wait_timeout={seconds}"))
    }
}

/// A prepared statement.
pub trait Statement {
    /// Bind `value` to the 1-based `position`.
    fn bind(&mut self, position: usize, value: &Value, bind_type: BindType) -> DbResult<()>;

    fn execute(&mut self) -> DbResult<Cursor>;
}
