//! Safe SQL identifier handling.
//!
//! Identifiers cannot be bound as parameters, so any table or column name that
//! reaches the SQL text goes through [`Ident`]:
//!
//! - one to three `.`-separated segments (`column`, `table.column`, `db.table.column`)
//! - each segment matches `[A-Za-z0-9_-]+`
//! - each segment is wrapped in backticks on output (`orders.total` → `` `orders`.`total` ``)
//!
//! # Example
//! ```ignore
//! use sqlplate::Ident;
//!
//! let ident = Ident::parse("orders.total").unwrap();
//! assert_eq!(ident.to_sql(), "`orders`.`total`");
//! ```

use crate::value::{Param, Value};
use std::fmt;

const MAX_SEGMENTS: usize = 3;

/// A validated SQL identifier (column, table, or database-qualified name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    parts: Vec<String>,
}

impl Ident {
    /// Parse an identifier string. Returns `None` if it fails validation.
    pub fn parse(s: &str) -> Option<Self> {
        if !validate_name(s) {
            return None;
        }
        Some(Self {
            parts: s.split('.').map(str::to_string).collect(),
        })
    }

    /// Identifier from a template parameter.
    ///
    /// Text is taken as-is; integers and floats are rendered first (so `5` or
    /// `1.5` are valid names). Anything else is rejected.
    pub fn from_param(param: &Param) -> Option<Self> {
        match param {
            Param::Value(Value::Text(s)) => Self::parse(s),
            Param::Value(v @ (Value::Int(_) | Value::Float(_))) => Self::parse(&v.to_text()),
            _ => None,
        }
    }

    /// Segments, unquoted.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Render the identifier as quoted SQL.
    pub fn to_sql(&self) -> String {
        let cap = self.parts.iter().map(|p| p.len() + 3).sum::<usize>();
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push('`');
            out.push_str(part);
            out.push('`');
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Check that `name` is a valid identifier.
pub fn validate_name(name: &str) -> bool {
    let mut segments = 0;
    for seg in name.split('.') {
        segments += 1;
        if segments > MAX_SEGMENTS || seg.is_empty() {
            return false;
        }
        if !seg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return false;
        }
    }
    true
}

/// Backtick-quote each segment of an already validated name.
pub fn protect_name(name: &str) -> String {
    name.split('.')
        .map(|part| format!("`{part}`"))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("users").unwrap();
        assert_eq!(ident.to_sql(), "`users`");
    }

    #[test]
    fn ident_dotted() {
        let ident = Ident::parse("orders.total").unwrap();
        assert_eq!(ident.to_sql(), "`orders`.`total`");
    }

    #[test]
    fn ident_three_parts() {
        let ident = Ident::parse("shop.orders.total").unwrap();
        assert_eq!(ident.to_sql(), "`shop`.`orders`.`total`");
        assert_eq!(ident.parts().len(), 3);
    }

    #[test]
    fn ident_allows_dash_digits_and_case() {
        assert!(validate_name("order-items"));
        assert!(validate_name("1table"));
        assert!(validate_name("CamelCase_2"));
    }

    #[test]
    fn ident_rejects_four_parts() {
        assert!(!validate_name("a.b.c.d"));
    }

    #[test]
    fn ident_rejects_injection() {
        assert!(!validate_name("orders;drop"));
        assert!(!validate_name("a`b"));
        assert!(!validate_name("my table"));
    }

    #[test]
    fn ident_rejects_empty_segments() {
        assert!(!validate_name(""));
        assert!(!validate_name("schema..table"));
        assert!(!validate_name("schema."));
        assert!(!validate_name(".table"));
    }

    #[test]
    fn ident_from_numeric_param() {
        assert_eq!(Ident::from_param(&5.into()).unwrap().to_sql(), "`5`");
        assert_eq!(Ident::from_param(&1.5.into()).unwrap().to_sql(), "`1`.`5`");
        assert!(Ident::from_param(&true.into()).is_none());
        assert!(Ident::from_param(&Param::null()).is_none());
        assert!(Ident::from_param(&Param::list(["a"])).is_none());
    }

    #[test]
    fn protect_name_quotes_each_segment() {
        assert_eq!(protect_name("a.b"), "`a`.`b`");
    }
}
