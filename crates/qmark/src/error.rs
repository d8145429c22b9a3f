//! Error types for qmark

use thiserror::Error;

/// Result type alias for qmark operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Error types for query construction, compilation, and execution
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The builder was driven into an invalid shape (no table, LIMIT set
    /// twice, joins on a mutation statement, ...). Detected at compile time.
    #[error("Structural error: {0}")]
    Structural(String),

    /// A raw fragment's placeholder count does not match its bindings.
    #[error("Binding mismatch: fragment has {expected} placeholder(s) but {supplied} binding(s) were supplied")]
    BindingMismatch { expected: usize, supplied: usize },

    /// Comparison operator outside the allowed set
    #[error("Unsupported operator: {0:?}")]
    UnsupportedOperator(String),

    /// No grammar registered for the requested dialect
    #[error("Unknown dialect: {0:?}")]
    UnknownDialect(String),

    /// Surfaced verbatim from the execution collaborator
    #[error("Execution error: {0}")]
    Execution(String),

    /// Row decode/hydration error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl QueryError {
    /// Create a structural error
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Check if this is a structural error
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }

    /// Check if this is a binding mismatch error
    pub fn is_binding_mismatch(&self) -> bool {
        matches!(self, Self::BindingMismatch { .. })
    }

    /// Check if this is an execution error
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}
