// Key/value metadata table

use crate::error::Result;
use crate::schema::IndexStore;
use rusqlite::{params, Connection, OptionalExtension};

/// Schema version the index was written with
pub const KEY_SCHEMA_VERSION: &str = "schema_version";

/// Timestamp (RFC 3339) of the last completed reindex
pub const KEY_LAST_INDEXED_AT: &str = "last_indexed_at";

/// File count the IDF table was computed against
pub const KEY_IDF_FILE_COUNT: &str = "idf_file_count";

/// Forget which corpus the IDF table was computed against.
///
/// Runs inside every transaction that changes indexed content, so a reindex
/// interrupted before its IDF pass still sees the table as stale.
pub(crate) fn invalidate_idf(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM metadata WHERE key = ?1",
        params![KEY_IDF_FILE_COUNT],
    )?;
    Ok(())
}

impl IndexStore {
    /// Read a metadata value
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        self.with_conn("get_metadata", |conn| {
            conn.query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Write a metadata value
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = chrono::Utc::now().timestamp_millis();
        self.with_conn("set_metadata", |conn| {
            conn.execute(
                "INSERT INTO metadata (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![key, value, updated_at],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_metadata_round_trip() {
        let store = IndexStore::open_in_memory().unwrap();
        store.initialize().unwrap();

        assert_eq!(store.get_metadata(KEY_SCHEMA_VERSION).unwrap(), None);
        store.set_metadata(KEY_SCHEMA_VERSION, "1").unwrap();
        store.set_metadata(KEY_SCHEMA_VERSION, "2").unwrap();
        assert_eq!(
            store.get_metadata(KEY_SCHEMA_VERSION).unwrap().as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_metadata_cleared_with_cache() {
        let store = IndexStore::open_in_memory().unwrap();
        store.initialize().unwrap();
        store.set_metadata(KEY_LAST_INDEXED_AT, "2026-01-01T00:00:00Z").unwrap();
        store.clear_cache().unwrap();
        assert_eq!(store.get_metadata(KEY_LAST_INDEXED_AT).unwrap(), None);
    }

    #[rstest]
    #[case(KEY_SCHEMA_VERSION, "1")]
    #[case(KEY_LAST_INDEXED_AT, "2026-10-15T08:30:00+00:00")]
    #[case(KEY_IDF_FILE_COUNT, "42")]
    fn test_known_keys(#[case] key: &str, #[case] value: &str) {
        let store = IndexStore::open_in_memory().unwrap();
        store.initialize().unwrap();
        store.set_metadata(key, value).unwrap();
        assert_eq!(store.get_metadata(key).unwrap().as_deref(), Some(value));
    }
}
