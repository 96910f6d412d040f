//! Bind values and template parameters.
//!
//! [`Value`] is the scalar that ends up bound to a `?` marker. [`Param`] is what a
//! caller hands to a template: a scalar, an ordered list, or an ordered name → value
//! map. Compound parameters are never bound directly; only their leaf scalars are.
//!
//! Several placeholders interpret values loosely (`:limit` suppression, `:where`
//! omission, numeric bind inference, `:i`/`:d` coercion). Those rules live here as
//! explicit predicates so every call site agrees on them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar bind value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Loose truth test used to decide whether an optional clause is emitted.
    ///
    /// `NULL`, `false`, `0`, `0.0`, `""` and `"0"` are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !(s.is_empty() || s == "0"),
        }
    }

    /// Whether the value reads as a number: ints, floats, and decimal text
    /// such as `"42"`, `" -1.5"` or `"1e3"`.
    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Int(_) | Value::Float(_) => true,
            Value::Text(s) => is_numeric_str(s),
            Value::Null | Value::Bool(_) => false,
        }
    }

    /// Integer coercion: text uses its leading numeric prefix (`"12abc"` → 12),
    /// floats truncate toward zero and saturate at the `i64` bounds.
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(i) => *i,
            Value::Float(f) => float_to_int(*f),
            Value::Text(s) => {
                let prefix = numeric_prefix(s);
                if prefix.is_empty() {
                    return 0;
                }
                match prefix.parse::<i64>() {
                    Ok(i) => i,
                    Err(_) => prefix.parse::<f64>().map(float_to_int).unwrap_or(0),
                }
            }
        }
    }

    /// Float coercion, with the same prefix rule as [`Value::to_int`].
    pub fn to_float(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) => numeric_prefix(s).parse::<f64>().unwrap_or(0.0),
        }
    }

    /// Text coercion: `true` → `"1"`, `false` and `NULL` → `""`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null | Value::Bool(false) => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

fn float_to_int(f: f64) -> i64 {
    // `as` truncates toward zero, saturates, and maps NaN to 0.
    f as i64
}

const WS: &[char] = &[' ', '\t', '\n', '\r', '\x0B', '\x0C'];

/// Length in bytes of the decimal number starting at the beginning of `s`
/// (sign, digits, fraction, exponent). Zero if there is none.
fn number_len(s: &str) -> usize {
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }
    if digits == 0 {
        return 0;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

fn numeric_prefix(s: &str) -> &str {
    let s = s.trim_start_matches(WS);
    &s[..number_len(s)]
}

/// Whether the whole string is a decimal number, allowing surrounding whitespace.
pub fn is_numeric_str(s: &str) -> bool {
    let s = s.trim_matches(WS);
    let n = number_len(s);
    n > 0 && n == s.len()
}

/// A template parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Value(Value),
    List(Vec<Param>),
    Map(IndexMap<String, Param>),
}

impl Param {
    /// `NULL` parameter.
    pub fn null() -> Self {
        Param::Value(Value::Null)
    }

    /// Build an ordered map parameter (for `:set`).
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        Param::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list parameter.
    pub fn list<T, I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Param>,
    {
        Param::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Param::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Loose truth test; empty lists and maps are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Param::Value(v) => v.is_truthy(),
            Param::List(items) => !items.is_empty(),
            Param::Map(entries) => !entries.is_empty(),
        }
    }

    /// Short shape name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Param::Value(v) => v.type_name(),
            Param::List(_) => "list",
            Param::Map(_) => "map",
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }

            impl From<$ty> for Param {
                fn from(v: $ty) -> Self {
                    Param::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => |v| Value::Bool(v),
    i8 => |v| Value::Int(i64::from(v)),
    i16 => |v| Value::Int(i64::from(v)),
    i32 => |v| Value::Int(i64::from(v)),
    i64 => |v| Value::Int(v),
    u8 => |v| Value::Int(i64::from(v)),
    u16 => |v| Value::Int(i64::from(v)),
    u32 => |v| Value::Int(i64::from(v)),
    u64 => |v| Value::Int(i64::try_from(v).unwrap_or(i64::MAX)),
    usize => |v| Value::Int(i64::try_from(v).unwrap_or(i64::MAX)),
    isize => |v| Value::Int(v as i64),
    f32 => |v| Value::Float(f64::from(v)),
    f64 => |v| Value::Float(v),
    &str => |v| Value::Text(v.to_string()),
    String => |v| Value::Text(v),
    &String => |v| Value::Text(v.clone()),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::null(), Into::into)
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Value(v)
    }
}

impl From<&Value> for Param {
    fn from(v: &Value) -> Self {
        Param::Value(v.clone())
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(items: Vec<T>) -> Self {
        Param::list(items)
    }
}

impl<T: Into<Param>, const N: usize> From<[T; N]> for Param {
    fn from(items: [T; N]) -> Self {
        Param::list(items)
    }
}

impl<A: Into<Param>, B: Into<Param>> From<(A, B)> for Param {
    fn from((a, b): (A, B)) -> Self {
        Param::List(vec![a.into(), b.into()])
    }
}

impl<A: Into<Param>, B: Into<Param>, C: Into<Param>> From<(A, B, C)> for Param {
    fn from((a, b, c): (A, B, C)) -> Self {
        Param::List(vec![a.into(), b.into(), c.into()])
    }
}

impl<K: Into<String>, V: Into<Param>> From<IndexMap<K, V>> for Param {
    fn from(entries: IndexMap<K, V>) -> Self {
        Param::map(entries)
    }
}

impl<K: Into<String>, V: Into<Param>> From<BTreeMap<K, V>> for Param {
    fn from(entries: BTreeMap<K, V>) -> Self {
        Param::map(entries)
    }
}

/// JSON documents map naturally: arrays become lists, objects become maps in
/// document order. Numbers that fit `i64` stay integers.
impl From<serde_json::Value> for Param {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match v {
            J::Null => Param::null(),
            J::Bool(b) => b.into(),
            J::Number(n) => match n.as_i64() {
                Some(i) => i.into(),
                None => n.as_f64().map_or(Param::null(), Into::into),
            },
            J::String(s) => s.into(),
            J::Array(items) => Param::list(items),
            J::Object(entries) => Param::map(entries),
        }
    }
}

/// Build a `Vec<Param>` from heterogeneous expressions.
///
/// ```ignore
/// let params = sqlplate::params!["users", "id", 5];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Param>::new()
    };
    ($($p:expr),+ $(,)?) => {
        ::std::vec![$($crate::Param::from($p)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_loose_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(!Value::Text("0".into()).is_truthy());

        assert!(Value::Text("0.0".into()).is_truthy());
        assert!(Value::Text("false".into()).is_truthy());
        assert!(Value::Int(-1).is_truthy());

        assert!(!Param::List(vec![]).is_truthy());
        assert!(Param::List(vec![Param::null()]).is_truthy());
    }

    #[test]
    fn numeric_detection() {
        for s in ["1", "-12", "+3", "1.5", ".5", "5.", "1e3", "-2.5E-3", " 42", "42 "] {
            assert!(is_numeric_str(s), "{s:?} should be numeric");
        }
        for s in ["", " ", "abc", "1a", "0x1A", "1e", ".", "-", "1 2"] {
            assert!(!is_numeric_str(s), "{s:?} should not be numeric");
        }
        assert!(!Value::Bool(true).is_numeric());
        assert!(!Value::Null.is_numeric());
        assert!(Value::Float(0.1).is_numeric());
    }

    #[test]
    fn int_coercion_uses_leading_prefix() {
        assert_eq!(Value::from("12abc").to_int(), 12);
        assert_eq!(Value::from("  7").to_int(), 7);
        assert_eq!(Value::from("abc").to_int(), 0);
        assert_eq!(Value::from("1e3").to_int(), 1000);
        assert_eq!(Value::from("-3.9").to_int(), -3);
        assert_eq!(Value::from(3.99).to_int(), 3);
        assert_eq!(Value::from(true).to_int(), 1);
        assert_eq!(Value::Null.to_int(), 0);
        assert_eq!(Value::from(f64::NAN).to_int(), 0);
        assert_eq!(Value::from("99999999999999999999").to_int(), i64::MAX);
    }

    #[test]
    fn text_and_float_coercion() {
        assert_eq!(Value::from(true).to_text(), "1");
        assert_eq!(Value::from(false).to_text(), "");
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::from(1.5).to_text(), "1.5");
        assert_eq!(Value::from(2.0).to_text(), "2");
        assert_eq!(Value::from("2.5kg").to_float(), 2.5);
        assert_eq!(Value::from(4).to_float(), 4.0);
    }

    #[test]
    fn params_macro_and_conversions() {
        let p = crate::params!["users", 5, None::<i32>, vec![1, 2], ("a", ">", 3)];
        assert_eq!(p.len(), 5);
        assert_eq!(p[0], Param::Value(Value::Text("users".into())));
        assert_eq!(p[2], Param::null());
        assert_eq!(p[3], Param::List(vec![1.into(), 2.into()]));
        assert!(matches!(&p[4], Param::List(items) if items.len() == 3));
    }

    #[test]
    fn json_objects_keep_document_order() {
        let p = Param::from(serde_json::json!({"b": 1, "a": "x", "c": null}));
        let Param::Map(entries) = p else {
            panic!("expected map");
        };
        let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(entries["c"], Param::null());
    }
}
