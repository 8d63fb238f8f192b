// Index store schema and connection management

use crate::error::{Result, StorageError};
use crate::records::{HealthDetails, HealthStatus, MigrationStatus, StoreStats};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tables of a complete schema, parents first.
pub const EXPECTED_TABLES: [&str; 5] = [
    "files",
    "metadata",
    "term_frequencies",
    "document_vectors",
    "idf",
];

/// Most terms bound into one `IN (...)` list; stays under SQLite's
/// `SQLITE_MAX_VARIABLE_NUMBER` on old builds (999).
pub(crate) const MAX_BOUND_TERMS: usize = 900;

/// Deletion order for clearing: children before parents.
const CLEAR_ORDER: [&str; 5] = [
    "term_frequencies",
    "document_vectors",
    "idf",
    "metadata",
    "files",
];

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    path TEXT PRIMARY KEY,
    mtime INTEGER NOT NULL,
    content_hash TEXT NOT NULL,
    content TEXT,
    language TEXT,
    size INTEGER,
    indexed_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS term_frequencies (
    file_path TEXT NOT NULL REFERENCES files(path) ON DELETE CASCADE,
    term TEXT NOT NULL,
    frequency REAL NOT NULL,
    PRIMARY KEY (file_path, term)
);

CREATE TABLE IF NOT EXISTS document_vectors (
    file_path TEXT PRIMARY KEY REFERENCES files(path) ON DELETE CASCADE,
    magnitude REAL NOT NULL,
    term_count INTEGER NOT NULL,
    raw_terms TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS idf (
    term TEXT PRIMARY KEY,
    idf_value REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_hash ON files(content_hash);
CREATE INDEX IF NOT EXISTS idx_files_mtime ON files(mtime);
CREATE INDEX IF NOT EXISTS idx_term_frequencies_term ON term_frequencies(term);
"#;

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Whether to enable WAL mode (ignored for in-memory stores)
    pub wal_enabled: bool,

    /// Cache size in pages
    pub cache_size_pages: Option<i64>,

    /// How long a writer waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            wal_enabled: true,
            cache_size_pages: Some(10000),
            busy_timeout_ms: 5000,
        }
    }
}

/// Persistent index store.
///
/// Wraps a single SQLite connection behind a mutex so one handle can be shared
/// (`Arc<IndexStore>`) between concurrent indexers and searchers; conflicting
/// writes are serialized and each logical write runs in a transaction.
pub struct IndexStore {
    conn: Mutex<Option<Connection>>,
    path: Option<PathBuf>,
    config: StoreConfig,
}

impl IndexStore {
    /// Open a store at `path` with default config
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Open a store at `path`
    ///
    /// The schema is not created here; call [`IndexStore::initialize`].
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|e| StorageError::database("open", e))?;
        Self::configure(&conn, &config, true)?;
        debug!("Opened index store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: Some(path),
            config,
        })
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let config = StoreConfig::default();
        let conn = Connection::open_in_memory().map_err(|e| StorageError::database("open", e))?;
        Self::configure(&conn, &config, false)?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: None,
            config,
        })
    }

    fn configure(conn: &Connection, config: &StoreConfig, on_disk: bool) -> Result<()> {
        let op = "configure";
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| StorageError::database(op, e))?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| StorageError::database(op, e))?;

        if on_disk && config.wal_enabled {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(|e| StorageError::database(op, e))?;
            debug!("Journal mode: {}", mode);
        }

        if let Some(cache_size) = config.cache_size_pages {
            conn.pragma_update(None, "cache_size", cache_size)
                .map_err(|e| StorageError::database(op, e))?;
        }

        Ok(())
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::database(operation, "connection lock poisoned"))
    }

    /// Run `f` against the open connection, converting every failure into a
    /// [`StorageError`] tagged with `operation`.
    pub(crate) fn with_conn<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let mut guard = self.lock(operation)?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| StorageError::database(operation, "connection closed"))?;
        f(conn).map_err(|e| StorageError::database(operation, e))
    }

    /// Create every table and index if absent.
    ///
    /// Idempotent; calling it on a complete schema changes nothing.
    pub fn initialize(&self) -> Result<()> {
        self.with_conn("initialize", |conn| conn.execute_batch(SCHEMA))?;
        info!("Index store schema ready");
        Ok(())
    }

    fn existing_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2, ?3, ?4, ?5)",
        )?;
        let present: Vec<String> = stmt
            .query_map(params_from_iter(EXPECTED_TABLES.iter()), |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        // Report in schema order.
        Ok(EXPECTED_TABLES
            .iter()
            .filter(|name| present.iter().any(|p| p == *name))
            .map(|name| name.to_string())
            .collect())
    }

    /// Report which known tables exist.
    ///
    /// A store holding only some of the tables still counts as migrated;
    /// partial schemas are reported, not repaired. Never fails: a probe error
    /// comes back as `migrated == false` with the message.
    pub fn migration_status(&self) -> MigrationStatus {
        match self.with_conn("migration_status", |conn| Self::existing_tables(conn)) {
            Ok(tables) => MigrationStatus {
                migrated: !tables.is_empty(),
                table_count: tables.len(),
                expected_tables: EXPECTED_TABLES.len(),
                tables,
                error: None,
            },
            Err(e) => {
                warn!("Failed to read migration status: {}", e);
                MigrationStatus {
                    migrated: false,
                    table_count: 0,
                    expected_tables: EXPECTED_TABLES.len(),
                    tables: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Delete every row from every existing table, children first.
    ///
    /// The schema is left intact. Tables missing from a partial schema are
    /// skipped.
    pub fn clear_cache(&self) -> Result<()> {
        let cleared = self.with_conn("clear_cache", |conn| {
            let tables = Self::existing_tables(conn)?;
            let tx = conn.transaction()?;
            let mut cleared = 0usize;
            for table in CLEAR_ORDER {
                if tables.iter().any(|t| t == table) {
                    cleared += tx.execute(&format!("DELETE FROM {table}"), [])?;
                }
            }
            tx.commit()?;
            Ok(cleared)
        })?;
        info!("Cleared {} rows from index store", cleared);
        Ok(())
    }

    /// Check schema presence and connectivity.
    ///
    /// Never fails: any error during the probe is reported as unhealthy with
    /// its message.
    pub fn health_check(&self) -> HealthStatus {
        let probe = self.with_conn("health_check", |conn| {
            let tables = Self::existing_tables(conn)?;
            let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
            let cached_files: i64 = if tables.iter().any(|t| t == "files") {
                conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?
            } else {
                0
            };
            Ok((tables, one, cached_files))
        });

        match probe {
            Ok((tables, one, cached_files)) => {
                let details = HealthDetails {
                    tables_exist: tables.len() == EXPECTED_TABLES.len(),
                    table_count: tables.len(),
                    cached_files,
                };
                if one != 1 {
                    HealthStatus::unhealthy("connectivity probe returned an unexpected value", Some(details))
                } else if !details.tables_exist {
                    HealthStatus::unhealthy(
                        format!(
                            "schema incomplete: {} of {} tables present",
                            details.table_count,
                            EXPECTED_TABLES.len()
                        ),
                        Some(details),
                    )
                } else {
                    HealthStatus {
                        healthy: true,
                        error: None,
                        details: Some(details),
                    }
                }
            }
            Err(e) => {
                warn!("Index store health check failed: {}", e);
                HealthStatus::unhealthy(e.to_string(), None)
            }
        }
    }

    /// Row counts across the store.
    pub fn stats(&self) -> Result<StoreStats> {
        self.with_conn("stats", |conn| {
            let count = |table: &str| -> rusqlite::Result<i64> {
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            };
            Ok(StoreStats {
                files: count("files")?,
                term_rows: count("term_frequencies")?,
                vectors: count("document_vectors")?,
                idf_terms: count("idf")?,
            })
        })
    }

    /// Whether the connection has been closed
    pub fn is_closed(&self) -> bool {
        self.conn.lock().map(|guard| guard.is_none()).unwrap_or(true)
    }

    /// Close the connection, checkpointing the WAL first.
    ///
    /// Safe to call repeatedly; calls after the first are no-ops.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.lock("close")?;
        let Some(conn) = guard.take() else {
            return Ok(());
        };

        if self.path.is_some() && self.config.wal_enabled {
            let checkpoint = conn
                .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |row| row.get::<_, i64>(0))
                .optional();
            if let Err(e) = checkpoint {
                warn!("WAL checkpoint before close failed: {}", e);
            }
        }

        conn.close()
            .map_err(|(_, e)| StorageError::database("close", e))?;
        debug!("Index store closed");
        Ok(())
    }
}

impl Drop for IndexStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close index store cleanly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn table_names(store: &IndexStore) -> Vec<String> {
        store.migration_status().tables
    }

    #[test]
    fn test_store_creation() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = IndexStore::open(temp_file.path());
        assert!(store.is_ok());
    }

    #[test]
    fn test_fresh_store_not_migrated() {
        let store = IndexStore::open_in_memory().unwrap();
        let status = store.migration_status();
        assert!(!status.migrated);
        assert_eq!(status.table_count, 0);
        assert_eq!(status.expected_tables, 5);
    }

    #[test]
    fn test_initialize_creates_schema() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = IndexStore::open(temp_file.path()).unwrap();
        store.initialize().unwrap();

        let status = store.migration_status();
        assert!(status.migrated);
        assert!(status.is_complete());
        assert_eq!(table_names(&store), EXPECTED_TABLES.to_vec());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let store = IndexStore::open_in_memory().unwrap();
        store.initialize().unwrap();
        store.initialize().unwrap();
        assert_eq!(store.migration_status().table_count, 5);
    }

    #[test]
    fn test_partial_schema_reported_as_migrated() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .with_conn("test", |conn| {
                conn.execute_batch("CREATE TABLE files (path TEXT PRIMARY KEY)")
            })
            .unwrap();

        let status = store.migration_status();
        assert!(status.migrated);
        assert!(!status.is_complete());
        assert_eq!(status.tables, vec!["files".to_string()]);
    }

    #[test]
    fn test_health_check_healthy() {
        let store = IndexStore::open_in_memory().unwrap();
        store.initialize().unwrap();

        let health = store.health_check();
        assert!(health.healthy);
        assert!(health.error.is_none());
        let details = health.details.unwrap();
        assert!(details.tables_exist);
        assert_eq!(details.table_count, 5);
        assert_eq!(details.cached_files, 0);
    }

    #[test]
    fn test_health_check_without_schema() {
        let store = IndexStore::open_in_memory().unwrap();
        let health = store.health_check();
        assert!(!health.healthy);
        assert!(health.error.unwrap().contains("schema incomplete"));
    }

    #[test]
    fn test_health_check_after_close_does_not_fail() {
        let store = IndexStore::open_in_memory().unwrap();
        store.initialize().unwrap();
        store.close().unwrap();

        let health = store.health_check();
        assert!(!health.healthy);
        assert!(health.error.unwrap().contains("connection closed"));
        assert!(health.details.is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = IndexStore::open(temp_file.path()).unwrap();
        store.initialize().unwrap();
        assert!(store.close().is_ok());
        assert!(store.close().is_ok());
        assert!(store.is_closed());
    }

    #[test]
    fn test_operations_after_close_are_database_errors() {
        let store = IndexStore::open_in_memory().unwrap();
        store.close().unwrap();

        let err = store.initialize().unwrap_err();
        assert_eq!(err.operation(), "initialize");

        let status = store.migration_status();
        assert!(!status.migrated);
        assert!(status.error.is_some());
    }

    #[test]
    fn test_clear_cache_on_partial_schema() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .with_conn("test", |conn| {
                conn.execute_batch("CREATE TABLE idf (term TEXT PRIMARY KEY, idf_value REAL NOT NULL)")
            })
            .unwrap();
        assert!(store.clear_cache().is_ok());
    }
}
