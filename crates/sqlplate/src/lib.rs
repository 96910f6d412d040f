//! # sqlplate
//!
//! Placeholder-driven SQL templates for MySQL-dialect databases.
//!
//! ## Features
//!
//! - **Typed placeholders**: `:v :s :i :d :b` bind scalars, `:name :names` quote
//!   identifiers, `:set :where :in :limit` expand whole clauses
//! - **Injection-safe**: values are always bound, identifiers are validated and quoted
//! - **Lazy connections**: a session is opened on first use and reopened after `close()`
//! - **Named registry**: configure connections in code or TOML, look them up by name
//! - **Active record**: a small `Record` trait for table-backed entities
//!
//! ## Templates
//!
//! ```ignore
//! use sqlplate::{Param, parse, params};
//!
//! let q = parse(
//!     "SELECT :names FROM :name :where ORDER BY id :limit",
//!     params![
//!         ["id", "email"],
//!         "users",
//!         Param::list([
//!             Param::from(("status", "=", "active")),
//!             Param::from(("age", "between", [18, 65])),
//!         ]),
//!         [0, 20],
//!     ],
//! )?;
//! assert_eq!(
//!     q.sql(),
//!     "SELECT `id`,`email` FROM `users` \
//!      WHERE `status` = ? AND `age` BETWEEN ? AND ? ORDER BY id LIMIT 0,20"
//! );
//! ```
//!
//! ## Connections
//!
//! ```ignore
//! use sqlplate::{ConnectionRegistry, params};
//!
//! let mut registry = ConnectionRegistry::sqlite();
//! registry.load_toml_file("db.toml")?;
//!
//! let db = registry.get(None)?;
//! let id = db.insert(
//!     "INSERT INTO :name :set",
//!     params!["users", serde_json::json!({"email": "a@b.c"})],
//! )?;
//! let row = db.select_row("SELECT * FROM users WHERE id = :i", params![id])?;
//! ```

pub mod connection;
pub mod driver;
pub mod error;
pub mod ident;
pub mod parser;
pub mod record;
pub mod registry;
pub mod row;
pub mod value;

pub use connection::{Connection, ConnectionConfig};
pub use driver::{BindType, Driver, Session, Statement};
pub use error::{DbError, DbResult, ParseError, ParseResult};
pub use ident::{Ident, protect_name, validate_name};
pub use parser::{ParsedQuery, Placeholder, QueryParser, parse};
pub use record::{Fields, Record};
pub use registry::{ConnectionRegistry, ConnectionSettings};
pub use row::{Cursor, FromRow, FromValue, Row, RowKey};
pub use value::{Param, Value};

#[cfg(feature = "sqlite")]
pub use driver::SqliteDriver;
