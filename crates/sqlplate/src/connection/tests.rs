use super::*;
use crate::driver::Statement;
use crate::error::{DbError, ParseError};
use crate::params;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Log {
    connects: usize,
    raw: Vec<String>,
    prepared: Vec<String>,
    binds: Vec<(usize, Value, BindType)>,
}

/// Records every driver call. `SELECT` statements return one row `(a=1, b="x")`;
/// everything else reports 3 affected rows.
struct RecordingDriver {
    log: Arc<Mutex<Log>>,
    idle_statement: bool,
}

impl RecordingDriver {
    fn new() -> (Arc<Self>, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let driver = Arc::new(Self {
            log: Arc::clone(&log),
            idle_statement: true,
        });
        (driver, log)
    }
}

impl Driver for RecordingDriver {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn connect(&self, config: &ConnectionConfig) -> DbResult<Box<dyn Session>> {
        if config.host == "unreachable" {
            return Err(DbError::driver(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        self.log.lock().unwrap().connects += 1;
        Ok(Box::new(RecordingSession {
            log: Arc::clone(&self.log),
            idle_statement: self.idle_statement,
        }))
    }
}

struct RecordingSession {
    log: Arc<Mutex<Log>>,
    idle_statement: bool,
}

fn result_for(sql: &str) -> Cursor {
    if sql.starts_with("SELECT") {
        let columns: Arc<[String]> = vec!["a".to_string(), "b".to_string()].into();
        let row = Row::new(Arc::clone(&columns), vec![Value::Int(1), Value::from("x")]);
        Cursor::with_rows(columns, vec![row])
    } else {
        Cursor::affected(3)
    }
}

impl Session for RecordingSession {
    fn prepare<'s>(&'s mut self, sql: &str) -> DbResult<Box<dyn Statement + 's>> {
        self.log.lock().unwrap().prepared.push(sql.to_string());
        Ok(Box::new(RecordingStatement {
            log: Arc::clone(&self.log),
            sql: sql.to_string(),
        }))
    }

    fn query(&mut self, sql: &str) -> DbResult<Cursor> {
        self.log.lock().unwrap().raw.push(sql.to_string());
        Ok(result_for(sql))
    }

    fn last_insert_id(&self) -> DbResult<i64> {
        Ok(99)
    }

    fn idle_timeout_statement(&self, seconds: u32) -> Option<String> {
        self.idle_statement
            .then(|| format!("SET wait_timeout={seconds}"))
    }
}

struct RecordingStatement {
    log: Arc<Mutex<Log>>,
    sql: String,
}

impl Statement for RecordingStatement {
    fn bind(&mut self, position: usize, value: &Value, bind_type: BindType) -> DbResult<()> {
        self.log
            .lock()
            .unwrap()
            .binds
            .push((position, value.clone(), bind_type));
        Ok(())
    }

    fn execute(&mut self) -> DbResult<Cursor> {
        Ok(result_for(&self.sql))
    }
}

fn connection() -> (Connection, Arc<Mutex<Log>>) {
    let (driver, log) = RecordingDriver::new();
    let config = ConnectionConfig::new("db.local", "app", "secret", "shop");
    (Connection::new(config, driver), log)
}

#[test]
fn connects_lazily_once() {
    let (mut db, log) = connection();
    assert!(!db.is_connected());
    assert_eq!(log.lock().unwrap().connects, 0);

    db.select("SELECT 1", params![]).unwrap();
    db.select("SELECT 2", params![]).unwrap();
    assert!(db.is_connected());
    assert_eq!(log.lock().unwrap().connects, 1);
}

#[test]
fn close_then_reconnect() {
    let (mut db, log) = connection();
    db.connect().unwrap();
    db.close();
    assert!(!db.is_connected());

    db.update("UPDATE t SET a = 1", params![]).unwrap();
    assert_eq!(log.lock().unwrap().connects, 2);
}

#[test]
fn explicit_connect_replaces_session() {
    let (mut db, log) = connection();
    db.connect().unwrap();
    db.connect().unwrap();
    assert_eq!(log.lock().unwrap().connects, 2);
}

#[test]
fn no_params_is_raw_pass_through() {
    let (mut db, log) = connection();
    // Not parsed: `:name` would otherwise need a value.
    db.query("SELECT ':name'", params![]).unwrap();
    let log = log.lock().unwrap();
    assert_eq!(log.raw, vec!["SELECT ':name'".to_string()]);
    assert!(log.prepared.is_empty());
}

#[test]
fn params_are_expanded_and_bound_in_order() {
    let (mut db, log) = connection();
    db.query(
        "SELECT * FROM :name WHERE :name = :v AND flag = :v AND note = :v AND x = :v AND y = :v",
        params!["users", "id", "42", true, None::<i32>, "abc", 1.5],
    )
    .unwrap();

    let log = log.lock().unwrap();
    assert_eq!(
        log.prepared,
        vec![
            "SELECT * FROM `users` WHERE `id` = ? AND flag = ? AND note = ? AND x = ? AND y = ?"
                .to_string()
        ]
    );
    assert_eq!(
        log.binds,
        vec![
            (1, Value::from("42"), BindType::Int),
            (2, Value::Bool(true), BindType::Bool),
            (3, Value::Null, BindType::Null),
            (4, Value::from("abc"), BindType::Str),
            (5, Value::Float(1.5), BindType::Int),
        ]
    );
}

#[test]
fn parse_errors_abort_before_anything_runs() {
    let (mut db, log) = connection();
    let err = db
        .query("SELECT * FROM :name", params!["users", 1])
        .unwrap_err();
    assert_eq!(
        err.parse_error(),
        Some(&ParseError::TooManyValues { remaining: 1 })
    );

    let log = log.lock().unwrap();
    assert_eq!(log.connects, 0);
    assert!(log.prepared.is_empty());
    assert!(log.binds.is_empty());
}

#[test]
fn idle_timeout_is_set_on_connect() {
    let (driver, log) = RecordingDriver::new();
    let config = ConnectionConfig::new("db.local", "app", "secret", "shop").timeout(120);
    let mut db = Connection::new(config, driver);

    db.select_one("SELECT 1", params![]).unwrap();
    let log = log.lock().unwrap();
    assert_eq!(
        log.raw,
        vec!["SET wait_timeout=120".to_string(), "SELECT 1".to_string()]
    );
}

#[test]
fn no_idle_statement_without_timeout() {
    let (mut db, log) = connection();
    db.connect().unwrap();
    assert!(log.lock().unwrap().raw.is_empty());
}

#[test]
fn result_shaping() {
    let (mut db, _) = connection();

    let rows = db.select("SELECT a, b FROM t WHERE a = :i", params![1]).unwrap();
    assert_eq!(rows.len(), 1);

    let row = db.select_row("SELECT a, b FROM t", params![]).unwrap().unwrap();
    assert_eq!(row.get("b"), Some(&Value::from("x")));

    assert_eq!(
        db.select_one("SELECT a FROM t", params![]).unwrap(),
        Some(Value::Int(1))
    );
    assert_eq!(
        db.select_column("SELECT a FROM t", params![]).unwrap(),
        vec![Value::Int(1)]
    );

    let pairs = db.select_key_pair("SELECT a, b FROM t", params![]).unwrap();
    assert_eq!(pairs[&RowKey::Int(1)], Value::from("x"));

    let groups = db.select_group("SELECT a, b FROM t", params![]).unwrap();
    assert_eq!(groups[&RowKey::Int(1)].len(), 1);
}

#[test]
fn write_operations() {
    let (mut db, _) = connection();
    assert_eq!(db.update("UPDATE t :set", params![Param::map([("a", 1)])]).unwrap(), 3);
    assert_eq!(db.delete("DELETE FROM t", params![]).unwrap(), 3);
    assert_eq!(db.insert("INSERT INTO t :set", params![Param::map([("a", 1)])]).unwrap(), 99);
}

#[test]
fn driver_errors_propagate_unmodified() {
    let (driver, _) = RecordingDriver::new();
    let config = ConnectionConfig::new("unreachable", "app", "secret", "shop");
    let mut db = Connection::new(config, driver);

    let err = db.select("SELECT 1", params![]).unwrap_err();
    assert!(err.is_driver_error());
    assert_eq!(err.to_string(), "connection refused");
    assert!(!db.is_connected());
}

#[test]
fn log_truncation_respects_char_boundaries() {
    let sql = "é".repeat(150);
    let out = truncate_sql(&sql);
    assert!(out.ends_with("..."));
    assert!(out.len() <= MAX_LOGGED_SQL + 3);
    assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
}
