// Integration tests for the index store
//
// These tests exercise the store through its public API against an on-disk
// database: cascades, clearing, reopening and the never-failing probes.

#[cfg(test)]
mod tests {
    use lestockage::{DocumentVector, FileRecord, IndexStore, EXPECTED_TABLES};
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    /// Helper: Create an initialized store; the temp file must outlive it
    fn create_test_store() -> (NamedTempFile, IndexStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = IndexStore::open(temp_file.path()).unwrap();
        store.initialize().unwrap();
        (temp_file, store)
    }

    /// Helper: Index one file with the given terms
    fn index_file(store: &IndexStore, path: &str, terms: &[(&str, f64)]) {
        let terms: BTreeMap<String, f64> =
            terms.iter().map(|(t, w)| (t.to_string(), *w)).collect();
        let record = FileRecord {
            path: path.to_string(),
            mtime: 1_000,
            content_hash: format!("hash-{path}"),
            content: Some("content".to_string()),
            language: Some("typescript".to_string()),
            size: Some(7),
            indexed_at: 2_000,
        };
        let vector = DocumentVector {
            file_path: path.to_string(),
            magnitude: terms.values().map(|w| w * w).sum::<f64>().sqrt(),
            term_count: terms.len() as i64,
            raw_terms: terms.clone(),
        };
        store.write_file_index(&record, &terms, &vector).unwrap();
    }

    #[test]
    fn test_delete_leaves_no_residual_rows() {
        let (_file, store) = create_test_store();
        index_file(&store, "a.ts", &[("export", 0.5), ("main", 0.8)]);
        index_file(&store, "b.ts", &[("export", 0.5)]);

        store.delete_file("a.ts").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.term_rows, 1);
        assert_eq!(stats.vectors, 1);
        assert_eq!(store.term_row_count("a.ts").unwrap(), 0);
        assert!(store.document_vector("a.ts").unwrap().is_none());
    }

    #[test]
    fn test_clear_then_initialize_is_noop() {
        let (_file, store) = create_test_store();
        index_file(&store, "a.ts", &[("export", 0.5)]);
        store.upsert_idf("export", 0.0).unwrap();
        store.set_metadata("last_indexed_at", "now").unwrap();

        store.clear_cache().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.files + stats.term_rows + stats.vectors + stats.idf_terms, 0);
        assert!(store.migration_status().is_complete());

        store.initialize().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.files + stats.term_rows + stats.vectors + stats.idf_terms, 0);
        assert_eq!(store.get_metadata("last_indexed_at").unwrap(), None);
    }

    #[test]
    fn test_data_survives_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let store = IndexStore::open(temp_file.path()).unwrap();
            store.initialize().unwrap();
            index_file(&store, "src/lib.rs", &[("parser", 0.6)]);
            store.close().unwrap();
        }

        let store = IndexStore::open(temp_file.path()).unwrap();
        let status = store.migration_status();
        assert!(status.migrated);
        assert_eq!(status.table_count, EXPECTED_TABLES.len());
        assert_eq!(store.file_count().unwrap(), 1);
        assert_eq!(
            store.document_vector("src/lib.rs").unwrap().unwrap().term_count,
            1
        );
    }

    #[test]
    fn test_health_reports_cached_files() {
        let (_file, store) = create_test_store();
        index_file(&store, "a.ts", &[("export", 0.5)]);
        index_file(&store, "b.ts", &[("export", 0.5)]);

        let health = store.health_check();
        assert!(health.healthy);
        assert_eq!(health.details.unwrap().cached_files, 2);
    }

    #[test]
    fn test_close_twice_then_probe() {
        let (_file, store) = create_test_store();
        store.close().unwrap();
        store.close().unwrap();

        assert!(!store.health_check().healthy);
        let err = store.file_count().unwrap_err();
        assert!(err.to_string().contains("file_count"));
    }
}
