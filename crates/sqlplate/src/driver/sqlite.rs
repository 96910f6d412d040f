//! In-process SQLite driver (via `rusqlite`).
//!
//! SQLite understands most of the dialect the templates produce: backtick-quoted
//! identifiers, `?` markers, `LIMIT offset,count` and `IN (false)`. The one
//! exception is `INSERT INTO t SET a = ?, b = ?`, which is rewritten to the
//! column-list form before it is prepared.
//!
//! `database` is the file path (`:memory:` for a private in-memory database);
//! host, login and password are not used. There is no idle timeout to set.

use super::{BindType, Driver, Session, Statement};
use crate::connection::ConnectionConfig;
use crate::error::{DbError, DbResult};
use crate::row::{Cursor, Row};
use crate::value::{Value, is_numeric_str};
use rusqlite::types::{Null, ValueRef};
use std::sync::Arc;

/// SQLite driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self, config: &ConnectionConfig) -> DbResult<Box<dyn Session>> {
        let conn = rusqlite::Connection::open(&config.database)?;
        Ok(Box::new(SqliteSession { conn }))
    }
}

struct SqliteSession {
    conn: rusqlite::Connection,
}

impl Session for SqliteSession {
    fn prepare<'s>(&'s mut self, sql: &str) -> DbResult<Box<dyn Statement + 's>> {
        let stmt = match rewrite_insert_set(sql) {
            Some(rewritten) => self.conn.prepare(&rewritten)?,
            None => self.conn.prepare(sql)?,
        };
        Ok(Box::new(SqliteStatement { stmt }))
    }

    fn query(&mut self, sql: &str) -> DbResult<Cursor> {
        let mut stmt = self.prepare(sql)?;
        stmt.execute()
    }

    fn last_insert_id(&self) -> DbResult<i64> {
        Ok(self.conn.last_insert_rowid())
    }

    fn idle_timeout_statement(&self, _seconds: u32) -> Option<String> {
        None
    }
}

struct SqliteStatement<'conn> {
    stmt: rusqlite::Statement<'conn>,
}

impl Statement for SqliteStatement<'_> {
    fn bind(&mut self, position: usize, value: &Value, bind_type: BindType) -> DbResult<()> {
        match (bind_type, value) {
            (BindType::Null, _) | (_, Value::Null) => self.stmt.raw_bind_parameter(position, Null)?,
            (BindType::Bool, v) => self.stmt.raw_bind_parameter(position, v.is_truthy())?,
            (BindType::Int, Value::Int(i)) => self.stmt.raw_bind_parameter(position, *i)?,
            (BindType::Int, Value::Float(f)) => self.stmt.raw_bind_parameter(position, *f)?,
            (BindType::Int, Value::Text(s)) if is_numeric_str(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(i) => self.stmt.raw_bind_parameter(position, i)?,
                    Err(_) => self.stmt.raw_bind_parameter(position, Value::from(s).to_float())?,
                }
            }
            (_, v) => self.stmt.raw_bind_parameter(position, v.to_text())?,
        }
        Ok(())
    }

    fn execute(&mut self) -> DbResult<Cursor> {
        if self.stmt.column_count() == 0 {
            let changed = self.stmt.raw_execute()?;
            return Ok(Cursor::affected(changed as u64));
        }

        let columns: Arc<[String]> = self
            .stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let width = columns.len();
        let mut out = Vec::new();
        let mut rows = self.stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for (i, column) in columns.iter().enumerate() {
                values.push(decode(column, row.get_ref(i)?)?);
            }
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(Cursor::with_rows(columns, out))
    }
}

/// `INSERT INTO <target> SET c1 = ?,c2 = ?` → `INSERT INTO <target> (c1,c2) VALUES (?,?)`.
///
/// Keywords match case-insensitively with any whitespace around them. Only
/// statements made entirely of `column = ?` assignments are rewritten; anything
/// else is left for SQLite to judge.
fn rewrite_insert_set(sql: &str) -> Option<String> {
    let rest = keyword(sql, "INSERT")?;
    let rest = keyword(rest, "INTO")?;
    let target_end = rest.find(char::is_whitespace)?;
    let (target, rest) = rest.split_at(target_end);
    let assignments = keyword(rest, "SET")?;

    let mut columns = Vec::new();
    for assignment in assignments.trim_end().split(',') {
        let (column, value) = assignment.split_once('=')?;
        let column = column.trim();
        if value.trim() != "?" || column.is_empty() || column.contains(char::is_whitespace) {
            return None;
        }
        columns.push(column);
    }

    let markers = vec!["?"; columns.len()].join(",");
    Some(format!(
        "INSERT INTO {target} ({}) VALUES ({markers})",
        columns.join(",")
    ))
}

/// Strip leading whitespace and `kw`, which must be followed by whitespace.
/// Returns what follows, with its leading whitespace stripped.
fn keyword<'a>(sql: &'a str, kw: &str) -> Option<&'a str> {
    let sql = sql.trim_start();
    let head = sql.get(..kw.len())?;
    let rest = &sql[kw.len()..];
    if !head.eq_ignore_ascii_case(kw) || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}

/// Text comes back as text. Blobs must hold UTF-8; binary data has no
/// representation in [`Value`] and is reported as a decode error.
fn decode(column: &str, value: ValueRef<'_>) -> DbResult<Value> {
    let value = match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::Text(text.to_string()),
            Err(_) => {
                return Err(DbError::decode(
                    column,
                    format!("{}-byte blob is not valid UTF-8", bytes.len()),
                ));
            }
        },
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Box<dyn Session> {
        SqliteDriver
            .connect(&ConnectionConfig::new("", "", "", ":memory:"))
            .unwrap()
    }

    #[test]
    fn raw_query_and_affected_rows() {
        let mut s = session();
        s.query("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        let c = s.query("INSERT INTO t (name) VALUES ('a'), ('b')").unwrap();
        assert_eq!(c.row_count(), 2);
        assert_eq!(s.last_insert_id().unwrap(), 2);

        let rows = s.query("SELECT id, name FROM t ORDER BY id").unwrap().fetch_all();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("name"), Some(&Value::from("b")));
    }

    #[test]
    fn binds_follow_bind_type() {
        let mut s = session();
        let mut stmt = s.prepare("SELECT ?, ?, ?, ?, ?").unwrap();
        stmt.bind(1, &Value::from("42"), BindType::Int).unwrap();
        stmt.bind(2, &Value::from("2.5"), BindType::Int).unwrap();
        stmt.bind(3, &Value::Bool(true), BindType::Bool).unwrap();
        stmt.bind(4, &Value::Null, BindType::Null).unwrap();
        stmt.bind(5, &Value::from("x"), BindType::Str).unwrap();
        let row = stmt.execute().unwrap().fetch().unwrap();
        assert_eq!(
            row.values(),
            [
                Value::Int(42),
                Value::Float(2.5),
                Value::Int(1),
                Value::Null,
                Value::from("x"),
            ]
        );
    }

    #[test]
    fn dialect_features_are_accepted() {
        let mut s = session();
        s.query("CREATE TABLE `t` (`id` INTEGER)").unwrap();
        s.query("INSERT INTO t VALUES (1), (2), (3)").unwrap();
        let c = s
            .query("SELECT `t`.`id` FROM `t` WHERE `id` IN (false) LIMIT 0,10")
            .unwrap();
        assert_eq!(c.fetch_all().len(), 0);
        let c = s.query("SELECT id FROM t ORDER BY id LIMIT 1,1").unwrap();
        assert_eq!(c.fetch_column_all(), vec![Value::Int(2)]);
    }

    #[test]
    fn insert_set_is_rewritten() {
        assert_eq!(
            rewrite_insert_set("INSERT INTO `users` SET `name` = ?,`age` = ?").as_deref(),
            Some("INSERT INTO `users` (`name`,`age`) VALUES (?,?)")
        );
        assert_eq!(
            rewrite_insert_set("insert into `db`.`t` SET `id` = ?").as_deref(),
            Some("INSERT INTO `db`.`t` (`id`) VALUES (?)")
        );
        assert_eq!(
            rewrite_insert_set("\n    INSERT INTO `t`  SET `a` = ?,`b` = ?\n").as_deref(),
            Some("INSERT INTO `t` (`a`,`b`) VALUES (?,?)")
        );
        assert_eq!(
            rewrite_insert_set("INSERT  INTO\t`t`\n  SET `a` = ?").as_deref(),
            Some("INSERT INTO `t` (`a`) VALUES (?)")
        );
        assert_eq!(rewrite_insert_set("INSERTINTO t SET a = ?"), None);
        assert_eq!(rewrite_insert_set("INSERT INTO t (a) VALUES (?)"), None);
        assert_eq!(rewrite_insert_set("INSERT INTO t SET a = 1"), None);
        assert_eq!(rewrite_insert_set("UPDATE t SET a = ?"), None);

        let mut s = session();
        s.query("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        let mut stmt = s.prepare("INSERT INTO `t` SET `name` = ?").unwrap();
        stmt.bind(1, &Value::from("ann"), BindType::Str).unwrap();
        assert_eq!(stmt.execute().unwrap().row_count(), 1);
    }

    #[test]
    fn blobs_decode_only_when_utf8() {
        let mut s = session();
        let row = s.query("SELECT CAST('héllo' AS BLOB) AS b").unwrap().fetch().unwrap();
        assert_eq!(row.get("b"), Some(&Value::from("héllo")));

        let err = s.query("SELECT X'FF00FE' AS raw").unwrap_err();
        match err {
            DbError::Decode { column, message } => {
                assert_eq!(column, "raw");
                assert!(message.contains("3-byte blob"));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn driver_errors_pass_through() {
        let mut s = session();
        let err = s.query("SELEC 1").unwrap_err();
        assert!(err.is_driver_error());
    }
}
