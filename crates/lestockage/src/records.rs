// Typed table records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Indexed file metadata, keyed by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Project-relative path (unique key)
    pub path: String,

    /// Modification time in milliseconds since the Unix epoch
    pub mtime: i64,

    /// Content hash used for change detection
    pub content_hash: String,

    /// File content, when stored
    pub content: Option<String>,

    /// Detected language
    pub language: Option<String>,

    /// Size in bytes
    pub size: Option<i64>,

    /// When the record was last written, in milliseconds since the Unix epoch
    pub indexed_at: i64,
}

/// Per-file term vector summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVector {
    /// Owning file path
    pub file_path: String,

    /// L2 norm of the raw term weights
    pub magnitude: f64,

    /// Number of distinct terms
    pub term_count: i64,

    /// Raw term -> weight map
    pub raw_terms: BTreeMap<String, f64>,
}

/// Corpus-wide inverse document frequency of a term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdfEntry {
    /// Term
    pub term: String,

    /// `ln(N / df)`
    pub idf_value: f64,
}

/// One stored term weight joined with its document magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    /// File containing the term
    pub file_path: String,

    /// Matched term
    pub term: String,

    /// Raw weight of the term in the file
    pub frequency: f64,

    /// Magnitude of the file's vector
    pub magnitude: f64,
}

/// Which known tables exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    /// At least one known table exists
    pub migrated: bool,

    /// Number of known tables present
    pub table_count: usize,

    /// Number of tables a complete schema has
    pub expected_tables: usize,

    /// Names of the known tables present
    pub tables: Vec<String>,

    /// Probe failure, if the status could not be read
    pub error: Option<String>,
}

impl MigrationStatus {
    /// Whether every expected table is present
    pub fn is_complete(&self) -> bool {
        self.table_count == self.expected_tables
    }
}

/// Detail block of a health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDetails {
    /// Every expected table exists
    pub tables_exist: bool,

    /// Number of known tables present
    pub table_count: usize,

    /// Number of file records
    pub cached_files: i64,
}

/// Health check outcome. Never produced as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Schema present and connectivity probe succeeded
    pub healthy: bool,

    /// Failure message when unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Details, when the store could be inspected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

impl HealthStatus {
    /// Unhealthy status with a message
    pub fn unhealthy(error: impl Into<String>, details: Option<HealthDetails>) -> Self {
        Self {
            healthy: false,
            error: Some(error.into()),
            details,
        }
    }
}

/// Row counts across the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// File records
    pub files: i64,

    /// Term frequency rows
    pub term_rows: i64,

    /// Document vectors
    pub vectors: i64,

    /// IDF entries
    pub idf_terms: i64,
}
