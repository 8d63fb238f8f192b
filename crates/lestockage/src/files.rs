// File metadata persistence

use crate::error::Result;
use crate::metadata::invalidate_idf;
use crate::records::FileRecord;
use crate::schema::IndexStore;
use rusqlite::{params, Connection, OptionalExtension, Row};

const UPSERT_FILE: &str = "INSERT INTO files (path, mtime, content_hash, content, language, size, indexed_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(path) DO UPDATE SET
        mtime = excluded.mtime,
        content_hash = excluded.content_hash,
        content = excluded.content,
        language = excluded.language,
        size = excluded.size,
        indexed_at = excluded.indexed_at";

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        path: row.get(0)?,
        mtime: row.get(1)?,
        content_hash: row.get(2)?,
        content: row.get(3)?,
        language: row.get(4)?,
        size: row.get(5)?,
        indexed_at: row.get(6)?,
    })
}

/// Write a file row on an existing connection or transaction.
///
/// Updates in place so the file's child rows survive. Marks IDF stale.
pub(crate) fn write_file(conn: &Connection, record: &FileRecord) -> rusqlite::Result<()> {
    conn.execute(
        UPSERT_FILE,
        params![
            record.path,
            record.mtime,
            record.content_hash,
            record.content,
            record.language,
            record.size,
            record.indexed_at,
        ],
    )?;
    invalidate_idf(conn)
}

impl IndexStore {
    /// Insert or update a file record by path
    pub fn upsert_file(&self, record: &FileRecord) -> Result<()> {
        self.with_conn("upsert_file", |conn| {
            let tx = conn.transaction()?;
            write_file(&tx, record)?;
            tx.commit()
        })
    }

    /// Update only the modification time of a file.
    ///
    /// `indexed_at` is left alone: the indexed content did not change. Returns
    /// false when the path is unknown.
    pub fn touch_file(&self, path: &str, mtime: i64) -> Result<bool> {
        self.with_conn("touch_file", |conn| {
            let changed = conn.execute(
                "UPDATE files SET mtime = ?2 WHERE path = ?1",
                params![path, mtime],
            )?;
            Ok(changed > 0)
        })
    }

    /// Get one file record, content included
    pub fn get_file(&self, path: &str) -> Result<Option<FileRecord>> {
        self.with_conn("get_file", |conn| {
            conn.query_row(
                "SELECT path, mtime, content_hash, content, language, size, indexed_at
                 FROM files WHERE path = ?1",
                params![path],
                file_from_row,
            )
            .optional()
        })
    }

    /// All file records ordered by path, without content
    pub fn list_files(&self) -> Result<Vec<FileRecord>> {
        self.with_conn("list_files", |conn| {
            let mut stmt = conn.prepare(
                "SELECT path, mtime, content_hash, NULL, language, size, indexed_at
                 FROM files ORDER BY path",
            )?;
            let rows = stmt.query_map([], file_from_row)?;
            rows.collect()
        })
    }

    /// Stored content of a file, if any
    pub fn file_content(&self, path: &str) -> Result<Option<String>> {
        self.with_conn("file_content", |conn| {
            let content: Option<Option<String>> = conn
                .query_row(
                    "SELECT content FROM files WHERE path = ?1",
                    params![path],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(content.flatten())
        })
    }

    /// Number of file records
    pub fn file_count(&self) -> Result<i64> {
        self.with_conn("file_count", |conn| {
            conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
        })
    }

    /// Delete a file record and, by cascade, its term frequencies and vector.
    ///
    /// Returns false when the path was not stored.
    pub fn delete_file(&self, path: &str) -> Result<bool> {
        self.with_conn("delete_file", |conn| {
            let tx = conn.transaction()?;
            let deleted = tx.execute("DELETE FROM files WHERE path = ?1", params![path])?;
            if deleted > 0 {
                invalidate_idf(&tx)?;
            }
            tx.commit()?;
            Ok(deleted > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> IndexStore {
        let store = IndexStore::open_in_memory().unwrap();
        store.initialize().unwrap();
        store
    }

    fn record(path: &str, hash: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            mtime: 1_700_000_000_000,
            content_hash: hash.to_string(),
            content: Some("fn main() {}".to_string()),
            language: Some("rust".to_string()),
            size: Some(12),
            indexed_at: 1_700_000_000_500,
        }
    }

    #[test]
    fn test_upsert_and_get_file() {
        let store = store();
        let rec = record("src/main.rs", "h1");
        store.upsert_file(&rec).unwrap();

        assert_eq!(store.get_file("src/main.rs").unwrap(), Some(rec));
        assert_eq!(store.get_file("missing.rs").unwrap(), None);
    }

    #[test]
    fn test_upsert_replaces_by_path() {
        let store = store();
        store.upsert_file(&record("a.rs", "h1")).unwrap();
        let mut updated = record("a.rs", "h2");
        updated.content = None;
        store.upsert_file(&updated).unwrap();

        assert_eq!(store.file_count().unwrap(), 1);
        let got = store.get_file("a.rs").unwrap().unwrap();
        assert_eq!(got.content_hash, "h2");
        assert_eq!(got.content, None);
    }

    #[test]
    fn test_list_files_omits_content() {
        let store = store();
        store.upsert_file(&record("b.rs", "h")).unwrap();
        store.upsert_file(&record("a.rs", "h")).unwrap();

        let files = store.list_files().unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs", "b.rs"]);
        assert!(files.iter().all(|f| f.content.is_none()));
        assert_eq!(
            store.file_content("a.rs").unwrap().as_deref(),
            Some("fn main() {}")
        );
    }

    #[test]
    fn test_touch_file() {
        let store = store();
        store.upsert_file(&record("a.rs", "h")).unwrap();
        assert!(store.touch_file("a.rs", 42).unwrap());
        assert!(!store.touch_file("nope.rs", 42).unwrap());

        let got = store.get_file("a.rs").unwrap().unwrap();
        assert_eq!(got.mtime, 42);
        assert_eq!(got.indexed_at, 1_700_000_000_500);
        assert_eq!(got.content_hash, "h");
    }

    #[test]
    fn test_delete_file() {
        let store = store();
        store.upsert_file(&record("a.rs", "h")).unwrap();
        assert!(store.delete_file("a.rs").unwrap());
        assert!(!store.delete_file("a.rs").unwrap());
        assert_eq!(store.file_count().unwrap(), 0);
    }
}
