// Search service
//
// Keeps the index store in step with the enumerated files and answers ranked
// queries against it.

use crate::enumerator::{CandidateFile, FileEnumerator};
use crate::error::{Result, SearchError};
use crate::query::{validate_query, SearchOptions, SearchOutcome, SearchResult, SearchState};
use crate::ranking::{compute_idf, cosine_scores};
use crate::vector::TermVector;
use lejeton::Tokenizer;
use lestockage::{
    DocumentVector, FileRecord, HealthStatus, IndexStore, KEY_IDF_FILE_COUNT,
    KEY_LAST_INDEXED_AT, KEY_SCHEMA_VERSION,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Version written to the `schema_version` metadata key
pub const SCHEMA_VERSION: &str = "1";

/// Service behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Reindex before answering a search against an empty index
    pub auto_reindex: bool,

    /// Keep file content in the store so results can include it
    pub store_content: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            auto_reindex: true,
            store_content: true,
        }
    }
}

/// A file skipped during reindexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// File path
    pub path: String,

    /// Error category
    pub kind: String,

    /// Error message
    pub message: String,
}

/// Counts from one reindex pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexStats {
    /// Files indexed for the first time
    pub added: usize,

    /// Files re-tokenized because their content changed
    pub updated: usize,

    /// Files dropped because they are no longer enumerated
    pub removed: usize,

    /// Files whose content hash matched the stored record
    pub unchanged: usize,

    /// Files that failed and were skipped
    pub failed: usize,

    /// Details of every failure
    pub failures: Vec<FileFailure>,

    /// Whether the IDF table was recomputed
    pub idf_recomputed: bool,

    /// Wall time of the pass in milliseconds
    pub duration_ms: u64,
}

impl ReindexStats {
    /// Whether the corpus changed
    pub fn changed(&self) -> bool {
        self.added + self.updated + self.removed > 0
    }
}

/// Snapshot of the index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Indexed files
    pub files: i64,

    /// Distinct terms in the IDF table
    pub terms: i64,

    /// IDF table computed against a different corpus size
    pub idf_stale: bool,

    /// RFC 3339 time of the last completed reindex
    pub last_indexed_at: Option<String>,

    /// Every expected table exists
    pub schema_complete: bool,
}

/// TF-IDF search service over an injected index store.
///
/// Cheap to share: wrap in an `Arc` and call from any thread. All state lives
/// in the store; nothing is cached in memory.
pub struct SearchService {
    store: Arc<IndexStore>,
    enumerator: Arc<dyn FileEnumerator>,
    tokenizer: Tokenizer,
    config: ServiceConfig,
}

impl SearchService {
    /// Create a service with default settings
    pub fn new(
        store: Arc<IndexStore>,
        enumerator: Arc<dyn FileEnumerator>,
        tokenizer: Tokenizer,
    ) -> Self {
        Self {
            store,
            enumerator,
            tokenizer,
            config: ServiceConfig::default(),
        }
    }

    /// Replace the service settings
    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// The tokenizer shared by indexing and querying
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Create the schema on a fresh store.
    ///
    /// A partial schema is left as found and reported by `status()`.
    fn ensure_schema(&self) -> Result<()> {
        let status = self.store.migration_status();
        if let Some(error) = &status.error {
            return Err(lestockage::StorageError::database("migration_status", error).into());
        }
        if !status.migrated {
            info!("No index schema found, performing cold build");
            self.store.initialize()?;
        } else if !status.is_complete() {
            warn!(
                "Index schema is partial ({}/{} tables); run a clear to repair",
                status.table_count, status.expected_tables
            );
        }
        Ok(())
    }

    /// Reindex every file the enumerator reports.
    pub fn reindex(&self) -> Result<ReindexStats> {
        let candidates = self
            .enumerator
            .enumerate()
            .map_err(SearchError::Enumeration)?;
        self.reindex_files(candidates)
    }

    /// Bring the store in line with `candidates`.
    ///
    /// New or content-changed files are re-tokenized and written with their
    /// vector in one transaction. A matching hash skips tokenization; a
    /// changed mtime alone only refreshes the stored mtime. Files missing from
    /// `candidates` are deleted. IDF is recomputed when anything changed.
    ///
    /// A failure on one file is recorded and the batch continues; failures
    /// outside the per-file step abort the call.
    pub fn reindex_files(&self, candidates: Vec<CandidateFile>) -> Result<ReindexStats> {
        let started = Instant::now();
        self.ensure_schema()?;

        let stored: HashMap<String, FileRecord> = self
            .store
            .list_files()?
            .into_iter()
            .map(|record| (record.path.clone(), record))
            .collect();

        info!(
            "Reindexing {} candidates against {} stored files",
            candidates.len(),
            stored.len()
        );

        let mut stats = ReindexStats::default();
        let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());

        for candidate in &candidates {
            if !seen.insert(candidate.path.clone()) {
                warn!("Duplicate candidate {} ignored", candidate.path);
                continue;
            }

            match stored.get(&candidate.path) {
                Some(existing) if existing.content_hash == candidate.content_hash => {
                    if existing.mtime != candidate.mtime {
                        self.store.touch_file(&candidate.path, candidate.mtime)?;
                        debug!("Refreshed mtime of {}", candidate.path);
                    }
                    stats.unchanged += 1;
                }
                existing => match self.index_file(candidate) {
                    Ok(()) if existing.is_some() => stats.updated += 1,
                    Ok(()) => stats.added += 1,
                    Err(e) => {
                        warn!("Skipping {}: {}", candidate.path, e);
                        stats.failed += 1;
                        stats.failures.push(FileFailure {
                            path: candidate.path.clone(),
                            kind: e.kind().to_string(),
                            message: e.to_string(),
                        });
                    }
                },
            }
        }

        for path in stored.keys().filter(|path| !seen.contains(*path)) {
            if self.store.delete_file(path)? {
                debug!("Removed {}", path);
                stats.removed += 1;
            }
        }

        if stats.changed() || self.idf_stale()? {
            let terms = self.recompute_idf()?;
            debug!("IDF recomputed over {} terms", terms);
            stats.idf_recomputed = true;
        }

        self.store
            .set_metadata(KEY_LAST_INDEXED_AT, &chrono::Utc::now().to_rfc3339())?;
        self.store.set_metadata(KEY_SCHEMA_VERSION, SCHEMA_VERSION)?;

        stats.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Reindex complete: {} added, {} updated, {} removed, {} unchanged, {} failed in {}ms",
            stats.added,
            stats.updated,
            stats.removed,
            stats.unchanged,
            stats.failed,
            stats.duration_ms
        );
        Ok(stats)
    }

    fn index_file(&self, candidate: &CandidateFile) -> Result<()> {
        let max_bytes = self.tokenizer.config().max_input_bytes;
        if candidate.content.len() > max_bytes {
            return Err(SearchError::Tokenization {
                path: candidate.path.clone(),
                reason: format!(
                    "content is {} bytes, limit is {}",
                    candidate.content.len(),
                    max_bytes
                ),
            });
        }

        let tokens = self.tokenizer.tokenize(&candidate.content);
        let vector = TermVector::from_tokens(&tokens);

        let record = FileRecord {
            path: candidate.path.clone(),
            mtime: candidate.mtime,
            content_hash: candidate.content_hash.clone(),
            content: self
                .config
                .store_content
                .then(|| candidate.content.clone()),
            language: candidate.language.clone(),
            size: Some(candidate.content.len() as i64),
            indexed_at: chrono::Utc::now().timestamp_millis(),
        };
        let document = DocumentVector {
            file_path: candidate.path.clone(),
            magnitude: vector.magnitude,
            term_count: vector.term_count() as i64,
            raw_terms: vector.weights.clone(),
        };

        self.store
            .write_file_index(&record, &vector.weights, &document)?;
        Ok(())
    }

    /// The store drops the IDF marker in every content write, so a missing
    /// marker means a change landed after the last recompute.
    fn idf_stale(&self) -> Result<bool> {
        let files = self.store.file_count()?;
        match self.store.get_metadata(KEY_IDF_FILE_COUNT)? {
            Some(count) => Ok(count != files.to_string()),
            None => Ok(files > 0 || self.store.idf_count()? > 0),
        }
    }

    /// Recompute every IDF value over the current corpus.
    ///
    /// Returns the number of terms written. Queries running meanwhile may read
    /// the previous table.
    pub fn recompute_idf(&self) -> Result<usize> {
        let total = self.store.file_count()?;
        let frequencies = self.store.document_frequencies()?;
        let entries = compute_idf(total, &frequencies);
        self.store.replace_idf(&entries)?;
        self.store
            .set_metadata(KEY_IDF_FILE_COUNT, &total.to_string())?;
        Ok(entries.len())
    }

    fn indexed_files(&self) -> Result<i64> {
        let status = self.store.migration_status();
        if let Some(error) = &status.error {
            return Err(lestockage::StorageError::database("migration_status", error).into());
        }
        if !status.tables.iter().any(|t| t == "files") {
            return Ok(0);
        }
        Ok(self.store.file_count()?)
    }

    /// Rank indexed files against `query`.
    ///
    /// An empty index yields [`SearchState::NotIndexed`] (after one reindex
    /// attempt when `auto_reindex` is on), never an empty `Ok` outcome.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchOutcome> {
        let query = validate_query(query)?;
        options.validate()?;

        if self.indexed_files()? == 0 {
            if !self.config.auto_reindex {
                return Ok(SearchOutcome::not_indexed());
            }
            info!("Index is empty, reindexing before search");
            self.reindex()?;
            if self.indexed_files()? == 0 {
                return Ok(SearchOutcome::not_indexed());
            }
        }

        let query_vector = TermVector::from_tokens(&self.tokenizer.tokenize(query));
        if query_vector.is_empty() {
            debug!("Query {:?} produced no terms", query);
            return Ok(SearchOutcome {
                state: SearchState::Ok,
                results: Vec::new(),
            });
        }

        let terms = query_vector.terms();
        let postings = self.store.postings(&terms)?;
        let idf_values = self.store.idf_values(&terms)?;
        let scores = cosine_scores(&query_vector, &postings, &idf_values);

        let mut ranked: Vec<(String, f64)> = scores
            .into_iter()
            .filter(|(path, _)| options.accepts(path))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(options.limit);

        let mut results = Vec::with_capacity(ranked.len());
        for (path, score) in ranked {
            let content = if options.include_content {
                self.store.file_content(&path)?
            } else {
                None
            };
            results.push(SearchResult {
                path,
                score,
                content,
            });
        }

        debug!("Query {:?} matched {} files", query, results.len());
        Ok(SearchOutcome {
            state: SearchState::Ok,
            results,
        })
    }

    /// Empty the index.
    ///
    /// Idempotent. Missing tables of a partial schema are recreated.
    pub fn clear_index(&self) -> Result<()> {
        self.store.clear_cache()?;
        self.store.initialize()?;
        info!("Index cleared");
        Ok(())
    }

    /// Store health; never fails
    pub fn health_check(&self) -> HealthStatus {
        self.store.health_check()
    }

    /// Summary of the index
    pub fn status(&self) -> Result<IndexStatus> {
        let migration = self.store.migration_status();
        if let Some(error) = &migration.error {
            return Err(lestockage::StorageError::database("migration_status", error).into());
        }
        if !migration.is_complete() {
            return Ok(IndexStatus {
                files: self.indexed_files()?,
                ..IndexStatus::default()
            });
        }

        let stats = self.store.stats()?;
        Ok(IndexStatus {
            files: stats.files,
            terms: stats.idf_terms,
            idf_stale: self.idf_stale()?,
            last_indexed_at: self.store.get_metadata(KEY_LAST_INDEXED_AT)?,
            schema_complete: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::InMemoryEnumerator;
    use lejeton::TokenizerConfig;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn content_hash(content: &str) -> String {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    fn candidate(path: &str, content: &str) -> CandidateFile {
        CandidateFile {
            path: path.to_string(),
            mtime: 1_000,
            content_hash: content_hash(content),
            content: content.to_string(),
            language: None,
        }
    }

    fn service(files: Vec<CandidateFile>) -> (SearchService, Arc<InMemoryEnumerator>) {
        let store = Arc::new(IndexStore::open_in_memory().unwrap());
        let enumerator = Arc::new(InMemoryEnumerator::new(files));
        let service = SearchService::new(
            store,
            enumerator.clone(),
            Tokenizer::new(TokenizerConfig::default()),
        );
        (service, enumerator)
    }

    #[test]
    fn test_reindex_counts() {
        let (service, enumerator) = service(vec![
            candidate("a.ts", "export function main() {}"),
            candidate("b.ts", "export const value = 1"),
        ]);

        let stats = service.reindex().unwrap();
        assert_eq!((stats.added, stats.updated, stats.removed), (2, 0, 0));
        assert!(stats.idf_recomputed);

        enumerator.put(candidate("a.ts", "export function start() {}"));
        enumerator.remove("b.ts");
        let stats = service.reindex().unwrap();
        assert_eq!((stats.added, stats.updated, stats.removed), (0, 1, 1));
    }

    #[test]
    fn test_nothing_changed_skips_idf() {
        let (service, _) = service(vec![candidate("a.ts", "export function main() {}")]);
        service.reindex().unwrap();

        let stats = service.reindex().unwrap();
        assert_eq!(stats.unchanged, 1);
        assert!(!stats.changed());
        assert!(!stats.idf_recomputed);
    }

    #[test]
    fn test_interrupted_pass_recomputes_idf_next_time() {
        let (service, enumerator) = service(vec![
            candidate("a.ts", "export const alpha = beta"),
            candidate("b.ts", "export const gamma = delta"),
        ]);
        service.reindex().unwrap();

        // Content committed, then the pass stops before its IDF recompute.
        let edited = candidate("a.ts", "export const zebra = beta");
        service.index_file(&edited).unwrap();
        enumerator.put(edited);
        assert!(service.status().unwrap().idf_stale);

        let stats = service.reindex().unwrap();
        assert_eq!(stats.unchanged, 2);
        assert!(stats.idf_recomputed);
        assert!(!service.status().unwrap().idf_stale);

        let outcome = service.search("zebra", &SearchOptions::default()).unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].path, "a.ts");
        assert!(outcome.results[0].score > 0.0);
    }

    #[test]
    fn test_removing_every_file_clears_idf() {
        let (service, enumerator) = service(vec![candidate("a.ts", "export const alpha = beta")]);
        service.reindex().unwrap();

        enumerator.remove("a.ts");
        let stats = service.reindex().unwrap();
        assert_eq!(stats.removed, 1);
        assert!(stats.idf_recomputed);
        assert_eq!(service.store().idf_count().unwrap(), 0);
        assert!(!service.status().unwrap().idf_stale);
    }

    #[test]
    fn test_mtime_only_change_refreshes_metadata() {
        let (service, enumerator) = service(vec![candidate("a.ts", "export function main() {}")]);
        service.reindex().unwrap();
        let before = service.store().get_file("a.ts").unwrap().unwrap();

        let mut touched = candidate("a.ts", "export function main() {}");
        touched.mtime = 9_999;
        enumerator.put(touched);
        let stats = service.reindex().unwrap();

        let after = service.store().get_file("a.ts").unwrap().unwrap();
        assert_eq!(stats.unchanged, 1);
        assert_eq!(after.mtime, 9_999);
        assert_eq!(after.indexed_at, before.indexed_at);
    }

    #[test]
    fn test_oversized_file_fails_alone() {
        let store = Arc::new(IndexStore::open_in_memory().unwrap());
        let enumerator = Arc::new(InMemoryEnumerator::new(vec![
            candidate("big.js", &"token ".repeat(100)),
            candidate("small.js", "parse tokens"),
        ]));
        let service = SearchService::new(
            store,
            enumerator,
            Tokenizer::new(TokenizerConfig::default().with_max_input_bytes(64)),
        );

        let stats = service.reindex().unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.failures[0].path, "big.js");
        assert_eq!(stats.failures[0].kind, "tokenization");
    }

    #[test]
    fn test_search_rejects_empty_query() {
        let (service, _) = service(vec![]);
        let err = service.search("   ", &SearchOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_search_empty_index_is_not_indexed() {
        let (service, _) = service(vec![]);
        let outcome = service.search("anything", &SearchOptions::default()).unwrap();
        assert!(outcome.is_not_indexed());
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_search_without_auto_reindex() {
        let (service, _) = service(vec![candidate("a.ts", "export function main() {}")]);
        let service = service.with_config(ServiceConfig {
            auto_reindex: false,
            ..ServiceConfig::default()
        });
        let outcome = service.search("main", &SearchOptions::default()).unwrap();
        assert_eq!(outcome.state, SearchState::NotIndexed);
    }

    #[test]
    fn test_search_auto_reindexes_empty_store() {
        let (service, _) = service(vec![candidate("a.ts", "export function main() {}")]);
        let outcome = service.search("main", &SearchOptions::default()).unwrap();
        assert_eq!(outcome.state, SearchState::Ok);
        assert_eq!(outcome.results[0].path, "a.ts");
    }

    #[test]
    fn test_no_overlap_is_ok_and_empty() {
        let (service, _) = service(vec![candidate("a.ts", "export function main() {}")]);
        service.reindex().unwrap();
        let outcome = service
            .search("database migration", &SearchOptions::default())
            .unwrap();
        assert_eq!(outcome.state, SearchState::Ok);
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_content_included_on_request() {
        let (service, _) = service(vec![candidate("a.ts", "export function main() {}")]);
        service.reindex().unwrap();

        let plain = service.search("main", &SearchOptions::default()).unwrap();
        assert!(plain.results[0].content.is_none());

        let with_content = service
            .search("main", &SearchOptions::default().with_content(true))
            .unwrap();
        assert_eq!(
            with_content.results[0].content.as_deref(),
            Some("export function main() {}")
        );
    }

    #[test]
    fn test_status_tracks_idf() {
        let (service, _) = service(vec![
            candidate("a.ts", "export function main() {}"),
            candidate("b.ts", "export const value = 1"),
        ]);
        let before = service.status().unwrap();
        assert_eq!(before.files, 0);
        assert!(!before.schema_complete);

        service.reindex().unwrap();
        let after = service.status().unwrap();
        assert_eq!(after.files, 2);
        assert!(after.terms > 0);
        assert!(!after.idf_stale);
        assert!(after.last_indexed_at.is_some());
        assert!(after.schema_complete);
    }

    #[test]
    fn test_clear_index_is_idempotent() {
        let (service, _) = service(vec![candidate("a.ts", "export function main() {}")]);
        service.reindex().unwrap();
        service.clear_index().unwrap();
        service.clear_index().unwrap();

        assert_eq!(service.status().unwrap().files, 0);
        assert!(service.health_check().healthy);
    }
}
