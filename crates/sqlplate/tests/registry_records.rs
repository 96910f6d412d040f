#![cfg(feature = "sqlite")]

use sqlplate::{
    ConnectionRegistry, DbError, DbResult, Fields, Record, SqliteDriver, Value, params,
};
use std::sync::Arc;

#[derive(Debug)]
struct Article {
    fields: Fields,
}

impl Record for Article {
    fn table() -> String {
        "articles".into()
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

    fn before_save(&mut self) -> DbResult<()> {
        if !self.fields().has("status") {
            self.set("status", "draft");
        }
        Ok(())
    }
}

fn settings(dir: &std::path::Path) -> String {
    format!(
        r#"
[[connection]]
name = "blog"
host = "localhost"
login = "writer"
password = "secret"
database = "{}"
default = true

[[connection]]
name = "archive"
host = "localhost"
login = "reader"
password = "secret"
database = "{}"
"#,
        dir.join("blog.db").display(),
        dir.join("archive.db").display(),
    )
}

fn registry(dir: &std::path::Path) -> ConnectionRegistry {
    let path = dir.join("db.toml");
    std::fs::write(&path, settings(dir)).unwrap();

    let mut registry = ConnectionRegistry::new(Arc::new(SqliteDriver::new()));
    registry.load_toml_file(&path).unwrap();
    registry
        .get(None)
        .unwrap()
        .query(
            "CREATE TABLE articles (
                id INTEGER PRIMARY KEY,
                title TEXT,
                status TEXT,
                views INTEGER DEFAULT 0
            )",
            params![],
        )
        .unwrap();
    registry
}

#[test]
fn file_backed_connections_survive_close() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = registry(dir.path());

    let mut article = Article::create([("title", "hello")]);
    article.save(&mut registry).unwrap();
    assert_eq!(article.get("status"), &Value::from("draft"));

    registry.close_all();
    assert!(!registry.get(None).unwrap().is_connected());

    let stored = Article::find_by_id(&mut registry, article.id().cloned().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.get("title"), &Value::from("hello"));
    assert_eq!(stored.get("views"), &Value::Int(0));
}

#[test]
fn connections_are_isolated_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = registry(dir.path());

    let archive = registry.get(Some("archive")).unwrap();
    let err = archive
        .select("SELECT * FROM articles", params![])
        .unwrap_err();
    assert!(err.is_driver_error());

    let err = registry.get(Some("nope")).unwrap_err();
    assert!(matches!(err, DbError::NotConfigured(_)));
}

#[test]
fn update_touches_only_non_key_columns() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = registry(dir.path());

    for title in ["a", "b", "c"] {
        Article::create([("title", title)])
            .save(&mut registry)
            .unwrap();
    }

    let mut b = Article::find_one(&mut registry, "WHERE title = :s", params!["b"])
        .unwrap()
        .unwrap();
    b.set("status", "published");
    b.set("views", 10);
    b.save(&mut registry).unwrap();

    let published = Article::find(
        &mut registry,
        ":where ORDER BY id",
        params![[("status", "=", "published")]],
    )
    .unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id(), Some(&Value::Int(2)));
    assert_eq!(published[0].get("views"), &Value::Int(10));
    assert_eq!(Article::count(&mut registry, "", params![]).unwrap(), 3);
}

#[test]
fn export_for_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = registry(dir.path());

    let mut article = Article::create([("title", Value::from("json")), ("views", Value::Int(3))]);
    article.save(&mut registry).unwrap();
    article.refresh(&mut registry).unwrap();

    let public = article.fields().export(&["id", "title"], false);
    assert_eq!(
        serde_json::to_value(&public).unwrap(),
        serde_json::json!({"id": 1, "title": "json"})
    );
}
