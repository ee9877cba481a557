//! Error types for smartquery.
//!
//! One crate-wide error enum without server dependencies. Parse-time
//! variants carry the character position of the offending token so callers
//! can point at the exact spot in the filter string.

use thiserror::Error;

/// Query compiler error type
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Unknown operator '{opcode}' at position {position}")]
    UnknownOperator { opcode: String, position: usize },

    #[error("Invalid literal at position {position}: {message}")]
    InvalidLiteral { position: usize, message: String },

    #[error("Unterminated group opened at position {position}")]
    UnterminatedGroup { position: usize },

    #[error("Unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("Empty member segment at position {position}")]
    EmptyMemberSegment { position: usize },

    #[error("Unexpected token {found} at position {position}")]
    UnexpectedToken { position: usize, found: String },

    #[error("Invalid {name} value '{value}': expected an integer")]
    InvalidPagingValue { name: String, value: String },

    #[error("Operator '{operator}' is not supported by the {dialect} dialect")]
    UnsupportedOperator { operator: String, dialect: String },

    #[error("Unknown member: {0}")]
    UnknownMember(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for query compiler operations
pub type QueryResult<T> = Result<T, QueryError>;

impl serde::Serialize for QueryError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
