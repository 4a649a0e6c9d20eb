//! Error types for schema assembly and SQL compilation.

use crate::dialect::Dialect;

/// Errors raised while building schemas or compiling SQL.
///
/// Compilation either fully succeeds or fails before any SQL is returned;
/// none of these errors are retryable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A schema could not be assembled from declared or introspected metadata.
    #[error("Schema definition error: {0}")]
    SchemaDefinition(String),

    /// The target dialect cannot express the requested operation.
    #[error("Unsupported operation for {dialect}: {operation}")]
    Unsupported {
        /// Dialect the compilation targeted.
        dialect: Dialect,
        /// What was requested.
        operation: String,
    },

    /// A statement builder was used in a way no dialect can render.
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),
}

impl Error {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::SchemaDefinition(message.into())
    }

    pub(crate) fn unsupported(dialect: Dialect, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            dialect,
            operation: operation.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidStatement(message.into())
    }
}

/// Result type for schema and compilation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unsupported(Dialect::Sqlite, "ALTER COLUMN TYPE");
        assert_eq!(
            err.to_string(),
            "Unsupported operation for sqlite: ALTER COLUMN TYPE"
        );
        let err = Error::schema("user: no primary field");
        assert_eq!(
            err.to_string(),
            "Schema definition error: user: no primary field"
        );
    }
}
