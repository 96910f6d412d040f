//! Basic usage example for sqlplate
//!
//! Run with: cargo run --example basic -p sqlplate
//!
//! Uses an in-memory SQLite database, so nothing needs to be running.

use sqlplate::{
    ConnectionConfig, ConnectionRegistry, DbError, Fields, Param, Record, Value, params, parse,
};

#[derive(Debug)]
struct User {
    fields: Fields,
}

impl Record for User {
    fn table() -> String {
        "users".into()
    }

    fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }
}

fn main() -> Result<(), DbError> {
    // ============================================
    // Example 1: Template expansion only
    // ============================================
    println!("=== Template expansion ===");

    let q = parse(
        "SELECT :names FROM :name :where ORDER BY id :limit",
        params![
            ["id", "username"],
            "users",
            Param::list([
                Param::from(("status", "=", "active")),
                Param::from(("id", "in", [1, 2, 3])),
            ]),
            [0, 10],
        ],
    )?;
    println!("SQL:    {}", q.sql());
    println!("Values: {:?}", q.values());

    // ============================================
    // Example 2: Registry + raw statements
    // ============================================
    println!("\n=== Connection ===");

    let mut registry = ConnectionRegistry::sqlite();
    registry.configure("main", ConnectionConfig::sqlite(":memory:"), true)?;

    let db = registry.get(None)?;
    db.query(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            email TEXT
        )",
        params![],
    )?;

    // ============================================
    // Example 3: Insert / select / update
    // ============================================
    println!("\n=== Insert with :set ===");

    let alice = db.insert(
        "INSERT INTO :name :set",
        params![
            "users",
            serde_json::json!({"username": "alice", "email": "alice@example.com"})
        ],
    )?;
    let bob = db.insert(
        "INSERT INTO :name :set",
        params!["users", Param::map([("username", Value::from("bob")), ("email", Value::Null)])],
    )?;
    println!("Inserted ids: {alice}, {bob}");

    let row = db.select_row("SELECT * FROM users WHERE id = :i", params![alice])?;
    println!("Row: {}", serde_json::to_string(&row).unwrap_or_default());

    let names = db.select_key_pair("SELECT id, username FROM users ORDER BY id", params![])?;
    println!("Names: {names:?}");

    let changed = db.update(
        "UPDATE users :set WHERE id :in",
        params![Param::map([("status", "inactive")]), [bob]],
    )?;
    println!("Updated {changed} row(s)");

    let none = db.select("SELECT * FROM users WHERE id :in", params![Vec::<i64>::new()])?;
    println!("Empty IN list matched {} row(s)", none.len());

    // ============================================
    // Example 4: Active record
    // ============================================
    println!("\n=== Active record ===");

    let mut carol = User::create([("username", "carol")]);
    carol.save(&mut registry)?;
    println!("carol.id = {:?}", carol.id());

    carol.set("email", "carol@example.com");
    carol.save(&mut registry)?;

    let active = User::count(&mut registry, "WHERE status = :s", params!["active"])?;
    println!("Active users: {active}");

    for user in User::find(&mut registry, "ORDER BY id :limit", params![[2]])? {
        println!("  {:?}", user.fields().export(&["id", "username"], false));
    }

    let removed = User::find_and_delete(&mut registry, "WHERE status = :s", params!["inactive"])?;
    println!("Removed {removed} inactive user(s)");

    Ok(())
}
