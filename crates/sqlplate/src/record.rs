//! Active-record layer on top of [`ConnectionRegistry`].
//!
//! An entity type holds its column values in a [`Fields`] bag and implements
//! [`Record`]; table name, key column and connection name come from the trait's
//! associated functions and every query is built from the template placeholders.
//!
//! ```ignore
//! use sqlplate::{ConnectionRegistry, Fields, Record, params};
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     fields: Fields,
//! }
//!
//! impl Record for User {
//!     fn from_fields(fields: Fields) -> Self {
//!         Self { fields }
//!     }
//!     fn fields(&self) -> &Fields {
//!         &self.fields
//!     }
//!     fn fields_mut(&mut self) -> &mut Fields {
//!         &mut self.fields
//!     }
//! }
//!
//! let mut user = User::create([("name", "ann")]);
//! user.save(&mut registry)?;                      // INSERT, key filled in
//! let adults = User::find(&mut registry, "WHERE age >= :i", params![18])?;
//! ```

use crate::connection::Connection;
use crate::error::{DbError, DbResult};
use crate::registry::ConnectionRegistry;
use crate::row::Row;
use crate::value::{Param, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};


static NULL: Value = Value::Null;

/// Ordered column → value bag backing a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields {
    values: IndexMap<String, Value>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is present (a stored `NULL` counts).
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Like [`Fields::get`], reading absent names as `NULL`.
    pub fn get_or_null(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&NULL)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    /// Copy `values` in, filtered by `list`.
    ///
    /// An empty `list` imports everything. Otherwise only names in `list` are
    /// imported, or with `blacklist` only names *not* in it.
    pub fn import<K, V, I>(&mut self, values: I, list: &[&str], blacklist: bool)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in values {
            let name = name.into();
            if list.is_empty() || list.contains(&name.as_str()) != blacklist {
                self.values.insert(name, value.into());
            }
        }
    }

    /// Copy values out, filtered by `list` with the same rules as [`Fields::import`].
    ///
    /// A whitelist export keeps the order of `list` and skips names that are not set.
    pub fn export(&self, list: &[&str], blacklist: bool) -> IndexMap<String, Value> {
        if list.is_empty() {
            return self.values.clone();
        }
        if blacklist {
            return self
                .values
                .iter()
                .filter(|(name, _)| !list.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
        }
        list.iter()
            .filter_map(|name| {
                self.values
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The bag as a `:set` map parameter.
    pub fn to_param(&self) -> Param {
        Param::map(self.values.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl From<Row> for Fields {
    fn from(row: Row) -> Self {
        Self {
            values: row.into_map(),
        }
    }
}

impl From<IndexMap<String, Value>> for Fields {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        fields.import(iter, &[], false);
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// `my_app::models::UserGroup` → `usergroup`; generic arguments are ignored.
pub fn default_table_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}

/// A table-backed entity.
///
/// Implementors supply construction and access to their [`Fields`]; everything
/// else has defaults. Hooks run inside [`Record::save`] and [`Record::delete`] and
/// abort the operation by returning an error.
pub trait Record: Sized {
    /// Table name. Defaults to the lower-cased type name.
    fn table() -> String {
        default_table_name::<Self>()
    }

    /// Primary key column.
    fn key() -> &'static str {
        "id"
    }

    /// Registry connection name; `None` uses the default connection.
    fn conn() -> Option<&'static str> {
        None
    }

    fn from_fields(fields: Fields) -> Self;

    fn fields(&self) -> &Fields;

    fn fields_mut(&mut self) -> &mut Fields;

    fn before_save(&mut self) -> DbResult<()> {
        Ok(())
    }

    fn after_save(&mut self) -> DbResult<()> {
        Ok(())
    }

    fn before_delete(&mut self) -> DbResult<()> {
        Ok(())
    }

    /// Connection this record type talks to.
    fn db(registry: &mut ConnectionRegistry) -> DbResult<&mut Connection> {
        registry.get(Self::conn())
    }

    /// New (unsaved) record holding `values`.
    fn create<K, V, I>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::from_fields(values.into_iter().collect())
    }

    /// `SELECT * FROM <table> ` followed by `sql`; the table is bound to a
    /// leading `:name` so `params` covers only the placeholders in `sql`.
    fn find(
        registry: &mut ConnectionRegistry,
        sql: &str,
        params: Vec<Param>,
    ) -> DbResult<Vec<Self>> {
        let template = format!("SELECT * FROM :name {sql}");
        let rows = Self::db(registry)?.select(&template, with_table::<Self>(params))?;
        Ok(rows.into_iter().map(|row| Self::from_fields(row.into())).collect())
    }

    /// First match of [`Record::find`].
    fn find_one(
        registry: &mut ConnectionRegistry,
        sql: &str,
        params: Vec<Param>,
    ) -> DbResult<Option<Self>> {
        Ok(Self::find(registry, sql, params)?.into_iter().next())
    }

    fn find_by_id(
        registry: &mut ConnectionRegistry,
        id: impl Into<Value>,
    ) -> DbResult<Option<Self>> {
        let row = select_by_key::<Self>(registry, id.into())?;
        Ok(row.map(|row| Self::from_fields(row.into())))
    }

    /// The stored record, or an empty new one when there is no such row.
    fn find_by_id_or_create(
        registry: &mut ConnectionRegistry,
        id: impl Into<Value>,
    ) -> DbResult<Self> {
        let fields = select_by_key::<Self>(registry, id.into())?
            .map(Fields::from)
            .unwrap_or_default();
        Ok(Self::from_fields(fields))
    }

    /// Records from a complete query.
    fn find_by_sql(
        registry: &mut ConnectionRegistry,
        sql: &str,
        params: Vec<Param>,
    ) -> DbResult<Vec<Self>> {
        let rows = Self::db(registry)?.select(sql, params)?;
        Ok(rows.into_iter().map(|row| Self::from_fields(row.into())).collect())
    }

    /// `SELECT COUNT(*) FROM <table> ` followed by `sql`.
    fn count(registry: &mut ConnectionRegistry, sql: &str, params: Vec<Param>) -> DbResult<i64> {
        let template = format!("SELECT COUNT(*) FROM :name {sql}");
        let count = Self::db(registry)?.select_one(&template, with_table::<Self>(params))?;
        Ok(count.map_or(0, |v| v.to_int()))
    }

    /// Load with [`Record::find`] and delete each match; returns how many were deleted.
    fn find_and_delete(
        registry: &mut ConnectionRegistry,
        sql: &str,
        params: Vec<Param>,
    ) -> DbResult<usize> {
        let mut records = Self::find(registry, sql, params)?;
        for record in &mut records {
            record.delete(registry)?;
        }
        Ok(records.len())
    }

    /// Key value, if set.
    fn id(&self) -> Option<&Value> {
        self.fields().get(Self::key())
    }

    fn get(&self, name: &str) -> &Value {
        self.fields().get_or_null(name)
    }

    fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields_mut().set(name, value);
    }

    /// Insert when the key is unset or falsy, update otherwise.
    fn save(&mut self, registry: &mut ConnectionRegistry) -> DbResult<()> {
        self.before_save()?;

        let key = Self::key();
        match self.id().filter(|id| id.is_truthy()).cloned() {
            Some(id) => {
                let mut changes = self.fields().clone();
                changes.remove(key);
                Self::db(registry)?.update(
                    "UPDATE :name :set WHERE :name = :i",
                    vec![
                        Self::table().into(),
                        changes.to_param(),
                        key.into(),
                        id.into(),
                    ],
                )?;
            }
            None => {
                let values = if self.fields().is_empty() {
                    Param::map([(key, Param::null())])
                } else {
                    self.fields().to_param()
                };
                let id = Self::db(registry)?
                    .insert("INSERT INTO :name :set", vec![Self::table().into(), values])?;
                self.fields_mut().set(key, id);
            }
        }

        self.after_save()
    }

    /// Delete the stored row; returns the number of rows removed.
    fn delete(&mut self, registry: &mut ConnectionRegistry) -> DbResult<u64> {
        let id = match self.id() {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                return Err(DbError::record(format!(
                    "cannot delete from '{}' without a value for '{}'",
                    Self::table(),
                    Self::key()
                )));
            }
        };

        self.before_delete()?;
        Self::db(registry)?.delete(
            "DELETE FROM :name WHERE :name = :i",
            vec![Self::table().into(), Self::key().into(), id.into()],
        )
    }

    /// Reload every column from the stored row.
    fn refresh(&mut self, registry: &mut ConnectionRegistry) -> DbResult<()> {
        let id = match self.id() {
            Some(id) if id.is_truthy() => id.clone(),
            _ => {
                return Err(DbError::record(format!(
                    "cannot refresh '{}' without a value for '{}'",
                    Self::table(),
                    Self::key()
                )));
            }
        };

        let row = select_by_key::<Self>(registry, id.clone())?.ok_or_else(|| {
            DbError::not_found(format!("{} with {} = {id}", Self::table(), Self::key()))
        })?;
        self.fields_mut().import(row.into_map(), &[], false);
        Ok(())
    }
}

fn with_table<R: Record>(params: Vec<Param>) -> Vec<Param> {
    let mut all = Vec::with_capacity(params.len() + 1);
    all.push(Param::from(R::table()));
    all.extend(params);
    all
}

fn select_by_key<R: Record>(
    registry: &mut ConnectionRegistry,
    id: Value,
) -> DbResult<Option<Row>> {
    R::db(registry)?.select_row(
        "SELECT * FROM :name WHERE :name = :i",
        vec![R::table().into(), R::key().into(), id.into()],
    )
}
