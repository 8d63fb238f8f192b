// Project file walker
//
// *Le Promeneur* (The Walker) - Filesystem enumeration for the search service

use crate::config::{language_for_extension, ExclusionConfig, LanguageConfig, ProjectConfig};
use chrono::{DateTime, Utc};
use lerecherche::{CandidateFile, FileEnumerator};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Enumerates source files under a project root with `walkdir`, applying
/// exclusion and language rules and hashing content with BLAKE3.
#[derive(Debug, Clone)]
pub struct WalkdirEnumerator {
    root: PathBuf,
    extensions: BTreeSet<String>,
    exclusions: ExclusionConfig,
    max_file_bytes: u64,
    follow_links: bool,
}

impl WalkdirEnumerator {
    /// Walker over `root` with default rules
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self::from_config(root, &ProjectConfig::default())
    }

    /// Walker over `root` with a project's rules
    pub fn from_config<P: Into<PathBuf>>(root: P, config: &ProjectConfig) -> Self {
        Self {
            root: root.into(),
            extensions: config.languages.enabled_extensions(),
            exclusions: config.exclusions.clone(),
            max_file_bytes: config.index.max_file_bytes,
            follow_links: config.index.follow_links,
        }
    }

    /// Restrict to the given languages
    pub fn with_languages(mut self, languages: &LanguageConfig) -> Self {
        self.extensions = languages.enabled_extensions();
        self
    }

    /// Project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `/`-separated path of `path` relative to the root
    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    fn accepts_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }

    fn read_candidate(&self, path: &Path, relative: String) -> Option<CandidateFile> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                warn!("Cannot stat {}: {}", relative, e);
                return None;
            }
        };

        if metadata.len() > self.max_file_bytes {
            debug!(
                "Skipping {} ({} bytes exceeds {})",
                relative,
                metadata.len(),
                self.max_file_bytes
            );
            return None;
        }

        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                warn!("Cannot read {}: {}", relative, e);
                return None;
            }
        };
        let content_hash = blake3::hash(&bytes).to_hex().to_string();
        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                debug!("Skipping non-UTF-8 file {}", relative);
                return None;
            }
        };

        let mtime = metadata
            .modified()
            .map(|t| DateTime::<Utc>::from(t).timestamp_millis())
            .unwrap_or(0);
        let language = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(language_for_extension)
            .map(str::to_string);

        Some(CandidateFile {
            path: relative,
            mtime,
            content_hash,
            content,
            language,
        })
    }
}

impl FileEnumerator for WalkdirEnumerator {
    fn enumerate(&self) -> Result<Vec<CandidateFile>, String> {
        if !self.root.is_dir() {
            return Err(format!("{} is not a directory", self.root.display()));
        }

        let mut files = Vec::new();
        let mut walker = walkdir::WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            if entry.file_type().is_dir() {
                let name = entry.file_name().to_string_lossy();
                if self.exclusions.is_excluded_dir(&name) {
                    walker.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() || !self.accepts_extension(entry.path()) {
                continue;
            }

            let Some(relative) = self.relative(entry.path()) else {
                continue;
            };
            if self.exclusions.should_exclude(&relative) {
                continue;
            }

            if let Some(candidate) = self.read_candidate(entry.path(), relative) {
                files.push(candidate);
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Enumerated {} files under {}", files.len(), self.root.display());
        Ok(files)
    }
}
