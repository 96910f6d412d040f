use crate::value::Value;

/// Coercion applied by the scalar placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerce {
    /// `:v`, value bound unchanged
    None,
    /// `:s`
    Text,
    /// `:b`
    Bool,
    /// `:i`
    Int,
    /// `:d`
    Float,
}

impl Coerce {
    pub fn apply(self, value: Value) -> Value {
        match self {
            Coerce::None => value,
            Coerce::Text => Value::Text(value.to_text()),
            Coerce::Bool => Value::Bool(value.is_truthy()),
            Coerce::Int => Value::Int(value.to_int()),
            Coerce::Float => Value::Float(value.to_float()),
        }
    }
}

/// Placeholder kinds understood by the template language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Value(Coerce),
    Name,
    Names,
    Set,
    Where,
    In,
    Limit,
}

impl Placeholder {
    /// Resolve a token (with its leading colon).
    pub fn from_token(token: &str) -> Option<Self> {
        let kind = match token {
            ":v" => Placeholder::Value(Coerce::None),
            ":s" => Placeholder::Value(Coerce::Text),
            ":b" => Placeholder::Value(Coerce::Bool),
            ":i" => Placeholder::Value(Coerce::Int),
            ":d" => Placeholder::Value(Coerce::Float),
            ":name" => Placeholder::Name,
            ":names" => Placeholder::Names,
            ":set" => Placeholder::Set,
            ":where" => Placeholder::Where,
            ":in" => Placeholder::In,
            ":limit" => Placeholder::Limit,
            _ => return None,
        };
        Some(kind)
    }

    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Value(Coerce::None) => ":v",
            Placeholder::Value(Coerce::Text) => ":s",
            Placeholder::Value(Coerce::Bool) => ":b",
            Placeholder::Value(Coerce::Int) => ":i",
            Placeholder::Value(Coerce::Float) => ":d",
            Placeholder::Name => ":name",
            Placeholder::Names => ":names",
            Placeholder::Set => ":set",
            Placeholder::Where => ":where",
            Placeholder::In => ":in",
            Placeholder::Limit => ":limit",
        }
    }
}

/// Operators accepted in a `:where` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
    Like,
    Between,
    In,
}

impl Operator {
    /// Case-insensitive lookup.
    pub fn parse(op: &str) -> Option<Self> {
        let op = match op.to_uppercase().as_str() {
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            "LIKE" => Operator::Like,
            "BETWEEN" => Operator::Between,
            "IN" => Operator::In,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Like => "LIKE",
            Operator::Between => "BETWEEN",
            Operator::In => "IN",
        }
    }
}
