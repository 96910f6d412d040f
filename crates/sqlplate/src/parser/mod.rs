//! Placeholder-driven query templates.
//!
//! A template is plain SQL with typed placeholders (`:name`, `:set`, `:where`, ...).
//! [`parse`] expands it against an ordered parameter list into SQL with `?` markers
//! plus the matching bind values.
//!
//! Parameters are consumed strictly in order, one per placeholder, whatever the
//! placeholder kind.
//!
//! | Placeholder | Parameter | Output |
//! |---|---|---|
//! | `:v` `:s` `:b` `:i` `:d` | scalar | `?` (value as-is, or coerced to text/bool/int/float) |
//! | `:name` | identifier | `` `table`.`column` `` |
//! | `:names` | non-empty list of identifiers | `` `a`,`b` `` |
//! | `:set` | non-empty map | `` SET `a` = ?,`b` = ? `` |
//! | `:where` | list of `[column, operator, value]` | `` WHERE `a` > ? AND ... `` or nothing |
//! | `:in` | list of scalars | `IN (?,?)`, or `IN (false)` when empty |
//! | `:limit` | scalar or 1–2 element list | `LIMIT a` / `LIMIT a,b`, or nothing |
//!
//! # Example
//!
//! ```ignore
//! use sqlplate::{params, parse};
//!
//! let q = parse("SELECT * FROM :name WHERE :name = :i", params!["users", "id", 5])?;
//! assert_eq!(q.sql(), "SELECT * FROM `users` WHERE `id` = ?");
//! ```
//!
//! There is no escape for a literal `:word` sequence: any colon followed by
//! lowercase letters is treated as a placeholder.

mod expand;
mod placeholder;
mod token;


pub use expand::{ParsedQuery, QueryParser, parse};
pub use placeholder::{Coerce, Operator, Placeholder};
pub use token::{Segment, count_placeholders, tokenize};
