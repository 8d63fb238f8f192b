// Storage errors

use thiserror::Error;

/// Errors raised at the store boundary.
///
/// Every driver failure is converted here, tagged with the operation that
/// failed, before it leaves the crate.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Persistence layer failure (connection loss, constraint violation,
    /// corrupted rows, closed store)
    #[error("Database error during {operation}: {message}")]
    Database {
        /// Name of the failed store operation
        operation: String,
        /// Underlying failure description
        message: String,
    },
}

impl StorageError {
    /// Create a database error for an operation
    pub fn database(operation: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Database {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Name of the operation that failed
    pub fn operation(&self) -> &str {
        match self {
            StorageError::Database { operation, .. } => operation,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_carries_operation() {
        let err = StorageError::database("upsert_file", "disk I/O error");
        assert_eq!(err.operation(), "upsert_file");
        assert_eq!(
            err.to_string(),
            "Database error during upsert_file: disk I/O error"
        );
    }
}
