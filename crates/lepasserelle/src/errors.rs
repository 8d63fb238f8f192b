// Error Handling
//
// *La Gestion des Erreurs* (The Error Management) - User-facing error types

use lerecherche::SearchError;
use lestockage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for Lexique operations
pub type Result<T> = std::result::Result<T, LexiqueError>;

/// Lexique error types
#[derive(Debug, Error)]
pub enum LexiqueError {
    /// Malformed query or options
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong
        message: String,
        /// How to fix it
        suggestion: Option<String>,
    },

    /// Index store failure
    #[error("Storage error: {message}")]
    Storage {
        /// Store message, including the failed operation
        message: String,
        /// Whether clearing and reindexing is likely to help
        recoverable: bool,
    },

    /// Indexing failure outside the per-file step
    #[error("Indexing error: {message}")]
    Index {
        /// What failed
        message: String,
        /// Whether a retry is likely to help
        recoverable: bool,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
        /// How to fix it
        suggestion: Option<String>,
    },

    /// I/O errors with context
    #[error("I/O error: {context}")]
    Io {
        /// What was being done
        context: String,
        /// Path involved, if any
        path: Option<PathBuf>,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl LexiqueError {
    /// Create a validation error
    pub fn validation_error(message: impl Into<String>, suggestion: Option<String>) -> Self {
        LexiqueError::Validation {
            message: message.into(),
            suggestion,
        }
    }

    /// Create a storage error
    pub fn storage_error(message: impl Into<String>, recoverable: bool) -> Self {
        LexiqueError::Storage {
            message: message.into(),
            recoverable,
        }
    }

    /// Create an indexing error
    pub fn index_error(message: impl Into<String>, recoverable: bool) -> Self {
        LexiqueError::Index {
            message: message.into(),
            recoverable,
        }
    }

    /// Create a config error
    pub fn config_error(message: impl Into<String>, suggestion: Option<String>) -> Self {
        LexiqueError::Config {
            message: message.into(),
            suggestion,
        }
    }

    /// Create an I/O error
    pub fn io_error(context: impl Into<String>, path: Option<PathBuf>, source: std::io::Error) -> Self {
        LexiqueError::Io {
            context: context.into(),
            path,
            source,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            LexiqueError::Storage { recoverable, .. } => *recoverable,
            LexiqueError::Index { recoverable, .. } => *recoverable,
            LexiqueError::Validation { .. } => true,
            _ => false,
        }
    }

    /// Get user-friendly suggestion for recovery
    pub fn suggestion(&self) -> Option<String> {
        match self {
            LexiqueError::Validation { suggestion, .. } => suggestion.clone(),
            LexiqueError::Config { suggestion, .. } => suggestion.clone(),
            LexiqueError::Storage {
                recoverable: true, ..
            } => Some("Try `lexique clear` followed by `lexique index`.".to_string()),
            LexiqueError::Storage { .. } => {
                Some("Try deleting the .lexique directory and re-indexing.".to_string())
            }
            LexiqueError::Index {
                recoverable: true, ..
            } => Some("Check the project path and file permissions, then retry.".to_string()),
            _ => None,
        }
    }

    /// Short category name for structured output
    pub fn kind(&self) -> &'static str {
        match self {
            LexiqueError::Validation { .. } => "validation",
            LexiqueError::Storage { .. } => "database",
            LexiqueError::Index { .. } => "index",
            LexiqueError::Config { .. } => "config",
            LexiqueError::Io { .. } => "io",
        }
    }
}

impl From<StorageError> for LexiqueError {
    fn from(error: StorageError) -> Self {
        // Closed or poisoned connections stay broken.
        let message = error.to_string();
        let recoverable = !(message.contains("connection closed") || message.contains("poisoned"));
        LexiqueError::storage_error(message, recoverable)
    }
}

impl From<SearchError> for LexiqueError {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::Validation(message) => LexiqueError::validation_error(
                message,
                Some("Pass a non-empty query and a positive --limit.".to_string()),
            ),
            SearchError::Database(e) => e.into(),
            e @ SearchError::Tokenization { .. } => LexiqueError::index_error(e.to_string(), true),
            SearchError::Enumeration(message) => LexiqueError::index_error(
                format!("Could not enumerate project files: {}", message),
                true,
            ),
        }
    }
}

/// Format error for user display
pub fn format_error(error: &LexiqueError) -> String {
    let mut message = format!("Error: {}", error);

    if let Some(suggestion) = error.suggestion() {
        message.push_str(&format!("\n\nSuggestion: {}", suggestion));
    }

    if let LexiqueError::Io {
        path: Some(path), ..
    } = error
    {
        message.push_str(&format!("\n\nPath: {:?}", path));
    }

    message
}
