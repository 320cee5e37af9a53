//! Error types for Tabula
//!
//! Every failure aborts the current statement and is reported to the caller.
//! Errors fall into a handful of categories, see [`ErrorKind`].

use thiserror::Error;

/// Broad category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown table/column, duplicate table name
    Schema,
    /// NOT NULL and UNIQUE/PRIMARY KEY violations
    Constraint,
    /// Value failed to cast or compare
    Type,
    /// Statement text not recognized
    Syntax,
    /// Snapshot reading/writing
    Io,
}

/// The main error type for Tabula
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer / Parser Errors ==========
    #[error("Syntax error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Syntax error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Syntax error: invalid number format at position {0}")]
    InvalidNumber(usize),

    #[error("Syntax error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Syntax error: unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    #[error("Syntax error: {columns} column(s) but {values} value(s)")]
    ColumnCountMismatch { columns: usize, values: usize },

    #[error("Syntax error: join tables must match FROM and JOIN tables ({0})")]
    JoinTableMismatch(String),

    #[error("Syntax error: unsupported statement: {0}")]
    Unsupported(String),

    // ========== Schema Errors ==========
    #[error("Schema error: table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Schema error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Schema error: column '{0}' does not exist in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Schema error: column '{0}' declared twice in table '{1}'")]
    DuplicateColumn(String, String),

    #[error("Schema error: unknown type '{0}'")]
    UnknownType(String),

    // ========== Constraint Errors ==========
    #[error("Constraint error: column '{0}' is required")]
    MissingRequiredColumn(String),

    #[error("Constraint error: NULL value not allowed for column '{0}'")]
    NullNotAllowed(String),

    #[error("Constraint error: NULL value not allowed for non-nullable column")]
    NullValue,

    #[error("Constraint error: duplicate value for unique column '{column}': {value}")]
    DuplicateValue { column: String, value: String },

    // ========== Type Errors ==========
    #[error("Type error: invalid value for column '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    #[error("Type error: string length {len} exceeds max length {max}")]
    ValueTooLong { len: usize, max: usize },

    #[error("Type error: invalid date format: {0}")]
    InvalidDate(String),

    #[error("Type error: cannot convert {from} to {to}")]
    TypeMismatch { from: String, to: String },

    #[error("Type error: cannot compare {0} with {1}")]
    IncomparableValues(String, String),

    // ========== Snapshot Errors ==========
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    InvalidSnapshot(String),
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedCharacter(..)
            | Error::UnterminatedString(_)
            | Error::InvalidNumber(_)
            | Error::UnexpectedToken { .. }
            | Error::UnexpectedEof(_)
            | Error::ColumnCountMismatch { .. }
            | Error::JoinTableMismatch(_)
            | Error::Unsupported(_) => ErrorKind::Syntax,

            Error::TableNotFound(_)
            | Error::TableAlreadyExists(_)
            | Error::ColumnNotFound(..)
            | Error::DuplicateColumn(..)
            | Error::UnknownType(_) => ErrorKind::Schema,

            Error::MissingRequiredColumn(_)
            | Error::NullNotAllowed(_)
            | Error::NullValue
            | Error::DuplicateValue { .. } => ErrorKind::Constraint,

            Error::InvalidValue { .. }
            | Error::ValueTooLong { .. }
            | Error::InvalidDate(_)
            | Error::TypeMismatch { .. }
            | Error::IncomparableValues(..) => ErrorKind::Type,

            Error::Io(_) | Error::Serialization(_) | Error::InvalidSnapshot(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias for Tabula operations
pub type Result<T> = std::result::Result<T, Error>;
