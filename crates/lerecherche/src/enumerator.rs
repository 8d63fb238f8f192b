// Candidate file enumeration
//
// *L'Inventaire* (The Inventory) - What the service is told exists on disk

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// One source file offered for indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    /// Project-relative path
    pub path: String,

    /// Modification time in milliseconds since the Unix epoch
    pub mtime: i64,

    /// Hash of `content`
    pub content_hash: String,

    /// Full text content
    pub content: String,

    /// Detected language, if known
    pub language: Option<String>,
}

/// Supplies every candidate source file under a project root, already
/// filtered by ignore rules.
///
/// The search service never walks the filesystem itself.
pub trait FileEnumerator: Send + Sync {
    /// List all current candidates
    fn enumerate(&self) -> Result<Vec<CandidateFile>, String>;
}

/// Enumerator over a fixed, replaceable set of files.
#[derive(Debug, Default)]
pub struct InMemoryEnumerator {
    files: RwLock<Vec<CandidateFile>>,
}

impl InMemoryEnumerator {
    /// Create an enumerator over `files`
    pub fn new(files: Vec<CandidateFile>) -> Self {
        Self {
            files: RwLock::new(files),
        }
    }

    /// Replace the whole file set
    pub fn set_files(&self, files: Vec<CandidateFile>) {
        if let Ok(mut guard) = self.files.write() {
            *guard = files;
        }
    }

    /// Insert or replace one file by path
    pub fn put(&self, file: CandidateFile) {
        if let Ok(mut guard) = self.files.write() {
            match guard.iter_mut().find(|f| f.path == file.path) {
                Some(existing) => *existing = file,
                None => guard.push(file),
            }
        }
    }

    /// Remove one file by path
    pub fn remove(&self, path: &str) {
        if let Ok(mut guard) = self.files.write() {
            guard.retain(|f| f.path != path);
        }
    }
}

impl FileEnumerator for InMemoryEnumerator {
    fn enumerate(&self) -> Result<Vec<CandidateFile>, String> {
        self.files
            .read()
            .map(|files| files.clone())
            .map_err(|_| "file list lock poisoned".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> CandidateFile {
        CandidateFile {
            path: path.to_string(),
            mtime: 0,
            content_hash: "h".to_string(),
            content: String::new(),
            language: None,
        }
    }

    #[test]
    fn test_put_replaces_by_path() {
        let enumerator = InMemoryEnumerator::new(vec![file("a.rs")]);
        let mut changed = file("a.rs");
        changed.content_hash = "h2".to_string();
        enumerator.put(changed);
        enumerator.put(file("b.rs"));

        let files = enumerator.enumerate().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].content_hash, "h2");
    }

    #[test]
    fn test_remove() {
        let enumerator = InMemoryEnumerator::new(vec![file("a.rs"), file("b.rs")]);
        enumerator.remove("a.rs");
        assert_eq!(enumerator.enumerate().unwrap(), vec![file("b.rs")]);
    }
}
