//! lestockage - Persistent Index Store
//!
//! *Le Stockage* (The Storage) - SQLite tables holding file metadata, raw term
//! frequencies, document vectors and corpus-wide IDF values.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Storage error type.
pub mod error;
/// File metadata persistence.
pub mod files;
/// Corpus-wide IDF table.
pub mod idf;
/// Key/value metadata table.
pub mod metadata;
/// Typed records for every table.
pub mod records;
/// Schema, connection lifecycle, health and migration status.
pub mod schema;
/// Term frequencies and document vectors.
pub mod vectors;

pub use error::{Result, StorageError};
pub use records::{
    DocumentVector, FileRecord, HealthDetails, HealthStatus, IdfEntry, MigrationStatus, Posting,
    StoreStats,
};
pub use metadata::{KEY_IDF_FILE_COUNT, KEY_LAST_INDEXED_AT, KEY_SCHEMA_VERSION};
pub use schema::{IndexStore, StoreConfig, EXPECTED_TABLES};

/// Storage library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
