//! Error types for sqlplate

use thiserror::Error;

/// Result type alias for sqlplate operations
pub type DbResult<T> = Result<T, DbError>;

/// Result type alias for template expansion
pub type ParseResult<T> = Result<T, ParseError>;

fn at(element: &Option<usize>) -> String {
    match element {
        Some(n) => format!(" (element {n})"),
        None => String::new(),
    }
}

/// Template expansion errors.
///
/// These are caller contract violations (malformed template or parameter list);
/// nothing is executed when one of them is raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A placeholder was reached after every parameter had been consumed.
    #[error("No value supplied for placeholder '{placeholder}'")]
    MissingValue { placeholder: String },

    /// Parameters remain after the last placeholder.
    #[error("More values than placeholders: {remaining} value(s) left unconsumed")]
    TooManyValues { remaining: usize },

    /// Colon-letter sequence that is not a known placeholder.
    #[error("Unknown placeholder '{0}'")]
    UnknownPlaceholder(String),

    /// A bound value is not a scalar (bool, int, float, text or null).
    #[error("Invalid value for {placeholder}{}", at(.element))]
    InvalidScalarValue {
        placeholder: &'static str,
        element: Option<usize>,
    },

    /// An identifier failed validation.
    #[error("Invalid identifier for {placeholder}{}: {name}", at(.element))]
    InvalidIdentifier {
        placeholder: &'static str,
        element: Option<usize>,
        name: String,
    },

    /// A compound parameter has the wrong structure or arity.
    #[error("Invalid shape for {placeholder}: {message}")]
    InvalidShape {
        placeholder: &'static str,
        message: String,
    },

    /// A `:where` condition uses an operator outside the supported set.
    #[error("Unsupported operator '{operator}' in :where (element {element})")]
    InvalidOperator { element: usize, operator: String },
}

impl ParseError {
    pub(crate) fn shape(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            placeholder,
            message: message.into(),
        }
    }

    pub(crate) fn scalar(placeholder: &'static str, element: Option<usize>) -> Self {
        Self::InvalidScalarValue {
            placeholder,
            element,
        }
    }

    pub(crate) fn ident(
        placeholder: &'static str,
        element: Option<usize>,
        name: impl Into<String>,
    ) -> Self {
        Self::InvalidIdentifier {
            placeholder,
            element,
            name: name.into(),
        }
    }
}

/// Error types for database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// Template expansion failed before anything was sent to the driver
    #[error("Template error: {0}")]
    Parse(#[from] ParseError),

    /// Failure reported by the underlying driver, passed through as-is
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Registry lookup failed (unknown name or no default connection)
    #[error("Connection not configured: {0}")]
    NotConfigured(String),

    /// Malformed connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Active-record contract violation
    #[error("Record error: {0}")]
    Record(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl DbError {
    /// Wrap a driver error without reinterpreting it.
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a record error
    pub fn record(message: impl Into<String>) -> Self {
        Self::Record(message.into())
    }

    /// Template error, if this is one
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }

    /// Check if this is a template error
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Check if this is a driver error
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Driver(_))
    }

    /// Check if this is a registry lookup error
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::driver(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_position_is_rendered() {
        let err = ParseError::scalar(":in", Some(2));
        assert_eq!(err.to_string(), "Invalid value for :in (element 2)");

        let err = ParseError::scalar(":v", None);
        assert_eq!(err.to_string(), "Invalid value for :v");
    }

    #[test]
    fn driver_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = DbError::driver(io);
        assert_eq!(err.to_string(), "refused");
        assert!(err.is_driver_error());
    }

    #[test]
    fn parse_error_converts() {
        let err: DbError = ParseError::UnknownPlaceholder(":bogus".into()).into();
        assert!(err.is_parse_error());
        assert_eq!(
            err.parse_error(),
            Some(&ParseError::UnknownPlaceholder(":bogus".into()))
        );
    }
}
