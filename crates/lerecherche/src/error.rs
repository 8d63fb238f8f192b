// Search service errors

use lestockage::StorageError;
use thiserror::Error;

/// Errors surfaced by the search service.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed query or options
    #[error("Invalid search request: {0}")]
    Validation(String),

    /// Index store failure; fatal for the whole call
    #[error(transparent)]
    Database(#[from] StorageError),

    /// Input that could not be tokenized as given
    #[error("Tokenization failed for {path}: {reason}")]
    Tokenization {
        /// File being tokenized
        path: String,
        /// What went wrong
        reason: String,
    },

    /// The file enumerator could not list candidates
    #[error("File enumeration failed: {0}")]
    Enumeration(String),
}

impl SearchError {
    /// Short category name, stable for structured output
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Validation(_) => "validation",
            SearchError::Database(_) => "database",
            SearchError::Tokenization { .. } => "tokenization",
            SearchError::Enumeration(_) => "enumeration",
        }
    }
}

/// Result type for search service operations.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_is_transparent() {
        let err: SearchError = StorageError::database("postings", "disk full").into();
        assert_eq!(err.kind(), "database");
        assert_eq!(err.to_string(), "Database error during postings: disk full");
    }

    #[test]
    fn test_tokenization_message() {
        let err = SearchError::Tokenization {
            path: "big.js".to_string(),
            reason: "content exceeds 10 bytes".to_string(),
        };
        assert!(err.to_string().contains("big.js"));
        assert_eq!(err.kind(), "tokenization");
    }
}
