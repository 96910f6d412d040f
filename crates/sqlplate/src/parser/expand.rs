use super::placeholder::{Coerce, Operator, Placeholder};
use super::token::{Segment, tokenize};
use crate::error::{ParseError, ParseResult};
use crate::ident::Ident;
use crate::value::{Param, Value};
use std::collections::VecDeque;

const MAX_LIMIT_ARGS: usize = 2;

/// An expanded template: SQL with `?` markers and the values to bind, in marker order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    sql: String,
    values: Vec<Value>,
}

impl ParsedQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.values)
    }
}

/// Expand `template` against `params`.
pub fn parse(template: &str, params: Vec<Param>) -> ParseResult<ParsedQuery> {
    QueryParser::parse(template, params)
}

/// Single-use expansion state: the remaining parameter queue plus the output
/// buffer and bind list being accumulated.
#[derive(Debug)]
pub struct QueryParser {
    params: VecDeque<Param>,
    sql: String,
    values: Vec<Value>,
}

impl QueryParser {
    /// Expand `template` against `params`.
    ///
    /// Fails on the first invalid placeholder or parameter; on failure no partial
    /// output is returned.
    pub fn parse(template: &str, params: Vec<Param>) -> ParseResult<ParsedQuery> {
        let mut parser = Self {
            params: params.into(),
            sql: String::with_capacity(template.len()),
            values: Vec::new(),
        };

        for segment in tokenize(template) {
            match segment {
                Segment::Literal(text) => parser.sql.push_str(text),
                Segment::Placeholder(token) => parser.placeholder(token)?,
            }
        }

        if !parser.params.is_empty() {
            return Err(ParseError::TooManyValues {
                remaining: parser.params.len(),
            });
        }

        Ok(ParsedQuery {
            sql: parser.sql,
            values: parser.values,
        })
    }

    fn placeholder(&mut self, token: &str) -> ParseResult<()> {
        let kind = Placeholder::from_token(token)
            .ok_or_else(|| ParseError::UnknownPlaceholder(token.to_string()))?;
        let param = self.params.pop_front().ok_or_else(|| ParseError::MissingValue {
            placeholder: token.to_string(),
        })?;

        match kind {
            Placeholder::Value(coerce) => self.value(kind.token(), coerce, param),
            Placeholder::Name => self.name(&param),
            Placeholder::Names => self.names(&param),
            Placeholder::Set => self.set(param),
            Placeholder::Where => self.where_clause(param),
            Placeholder::In => self.in_list(param, ":in", None),
            Placeholder::Limit => self.limit(param),
        }
    }

    fn bind(&mut self, value: Value) {
        self.sql.push('?');
        self.values.push(value);
    }

    fn value(&mut self, token: &'static str, coerce: Coerce, param: Param) -> ParseResult<()> {
        let value = scalar(param).ok_or_else(|| ParseError::scalar(token, None))?;
        self.bind(coerce.apply(value));
        Ok(())
    }

    fn name(&mut self, param: &Param) -> ParseResult<()> {
        let ident = Ident::from_param(param)
            .ok_or_else(|| ParseError::ident(":name", None, describe(param)))?;
        ident.write_sql(&mut self.sql);
        Ok(())
    }

    fn names(&mut self, param: &Param) -> ParseResult<()> {
        let names = match param {
            Param::List(items) if !items.is_empty() => items,
            _ => {
                return Err(ParseError::shape(
                    ":names",
                    format!("expected a non-empty list, got {}", param.kind()),
                ));
            }
        };

        for (i, item) in names.iter().enumerate() {
            let ident = Ident::from_param(item)
                .ok_or_else(|| ParseError::ident(":names", Some(i + 1), describe(item)))?;
            if i > 0 {
                self.sql.push(',');
            }
            ident.write_sql(&mut self.sql);
        }
        Ok(())
    }

    fn set(&mut self, param: Param) -> ParseResult<()> {
        let entries = match param {
            Param::Map(entries) if !entries.is_empty() => entries,
            other => {
                return Err(ParseError::shape(
                    ":set",
                    format!("expected a non-empty map, got {}", other.kind()),
                ));
            }
        };

        self.sql.push_str(" SET ");
        for (i, (name, value)) in entries.into_iter().enumerate() {
            let element = Some(i + 1);
            let ident =
                Ident::parse(&name).ok_or_else(|| ParseError::ident(":set", element, &name))?;
            let value = scalar(value).ok_or_else(|| ParseError::scalar(":set", element))?;
            if i > 0 {
                self.sql.push(',');
            }
            ident.write_sql(&mut self.sql);
            self.sql.push_str(" = ");
            self.bind(value);
        }
        Ok(())
    }

    /// `:where`: a falsy parameter (empty list, `NULL`, `0`, `""`, ...) drops the
    /// whole clause, keyword included.
    fn where_clause(&mut self, param: Param) -> ParseResult<()> {
        if !param.is_truthy() {
            return Ok(());
        }
        let conditions = match param {
            Param::List(items) => items,
            other => {
                return Err(ParseError::shape(
                    ":where",
                    format!("expected a list of conditions, got {}", other.kind()),
                ));
            }
        };

        self.sql.push_str("WHERE ");
        for (i, condition) in conditions.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(" AND ");
            }
            self.condition(i + 1, condition)?;
        }
        Ok(())
    }

    fn condition(&mut self, element: usize, condition: Param) -> ParseResult<()> {
        let [column, operator, value] = triple(condition).ok_or_else(|| {
            ParseError::shape(
                ":where",
                format!("condition {element} must be a [column, operator, value] triple"),
            )
        })?;

        let ident = Ident::from_param(&column)
            .ok_or_else(|| ParseError::ident(":where", Some(element), describe(&column)))?;
        let op = match &operator {
            Param::Value(Value::Text(op)) => Operator::parse(op),
            _ => None,
        }
        .ok_or_else(|| ParseError::InvalidOperator {
            element,
            operator: describe(&operator),
        })?;

        ident.write_sql(&mut self.sql);
        self.sql.push(' ');
        match op {
            Operator::Between => {
                let bounds = match value {
                    Param::List(items) if items.len() == 2 => items,
                    other => {
                        return Err(ParseError::shape(
                            ":where",
                            format!(
                                "BETWEEN in condition {element} needs exactly two bounds, got {}",
                                other.kind()
                            ),
                        ));
                    }
                };
                let mut bounds = bounds.into_iter().map(scalar);
                let (Some(Some(low)), Some(Some(high))) = (bounds.next(), bounds.next()) else {
                    return Err(ParseError::scalar(":where", Some(element)));
                };
                self.sql.push_str("BETWEEN ");
                self.bind(low);
                self.sql.push_str(" AND ");
                self.bind(high);
            }
            Operator::In => self.in_list(value, ":where", Some(element))?,
            _ => {
                let value =
                    scalar(value).ok_or_else(|| ParseError::scalar(":where", Some(element)))?;
                self.sql.push_str(op.as_sql());
                self.sql.push(' ');
                self.bind(value);
            }
        }
        Ok(())
    }

    /// `IN (...)`. An empty (falsy) parameter renders `IN (false)` with nothing
    /// bound, since an empty `IN ()` list is a syntax error.
    ///
    /// `condition` is set when called for a `:where` condition; errors then point at
    /// the condition instead of the list element.
    fn in_list(
        &mut self,
        param: Param,
        placeholder: &'static str,
        condition: Option<usize>,
    ) -> ParseResult<()> {
        if !param.is_truthy() {
            self.sql.push_str("IN (false)");
            return Ok(());
        }
        let items = match param {
            Param::List(items) => items,
            other => {
                return Err(ParseError::shape(
                    placeholder,
                    format!("IN expects a list, got {}", other.kind()),
                ));
            }
        };

        self.sql.push_str("IN (");
        for (i, item) in items.into_iter().enumerate() {
            let value = scalar(item)
                .ok_or_else(|| ParseError::scalar(placeholder, condition.or(Some(i + 1))))?;
            if i > 0 {
                self.sql.push(',');
            }
            self.bind(value);
        }
        self.sql.push(')');
        Ok(())
    }

    /// `:limit`: one or two scalars rendered as integers. If none of them is truthy
    /// the clause is dropped.
    fn limit(&mut self, param: Param) -> ParseResult<()> {
        let args = match param {
            Param::List(items) => items,
            Param::Value(v) => vec![Param::Value(v)],
            Param::Map(_) => {
                return Err(ParseError::shape(":limit", "expected a scalar or a list"));
            }
        };
        if args.len() > MAX_LIMIT_ARGS {
            return Err(ParseError::shape(
                ":limit",
                format!("expected at most {MAX_LIMIT_ARGS} values, got {}", args.len()),
            ));
        }

        let args = args
            .into_iter()
            .enumerate()
            .map(|(i, arg)| {
                scalar(arg).ok_or_else(|| ParseError::scalar(":limit", Some(i + 1)))
            })
            .collect::<ParseResult<Vec<_>>>()?;

        if !args.iter().any(Value::is_truthy) {
            return Ok(());
        }

        let rendered: Vec<String> = args.iter().map(|v| v.to_int().to_string()).collect();
        self.sql.push_str("LIMIT ");
        self.sql.push_str(&rendered.join(","));
        Ok(())
    }
}

fn scalar(param: Param) -> Option<Value> {
    match param {
        Param::Value(v) => Some(v),
        _ => None,
    }
}

fn triple(param: Param) -> Option<[Param; 3]> {
    match param {
        Param::List(items) => <[Param; 3]>::try_from(items).ok(),
        _ => None,
    }
}

fn describe(param: &Param) -> String {
    match param {
        Param::Value(Value::Text(s)) => s.clone(),
        Param::Value(v) => v.to_string(),
        other => other.kind().to_string(),
    }
}
