// Query options and result shapes
//
// *La Question* (The Question) - What the caller asked for and what comes back

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};

/// Results returned when no limit is given
pub const DEFAULT_LIMIT: usize = 20;

/// Search options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Maximum results to return
    pub limit: usize,

    /// Include file content in each result
    pub include_content: bool,

    /// Path suffix allow-list (`"ts"` and `".ts"` are equivalent); empty allows all
    pub file_extensions: Vec<String>,

    /// Substring every result path must contain
    pub path_filter: Option<String>,

    /// Substrings that exclude a path
    pub exclude_paths: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            include_content: false,
            file_extensions: Vec::new(),
            path_filter: None,
            exclude_paths: Vec::new(),
        }
    }
}

impl SearchOptions {
    /// Set the result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Include content in results
    pub fn with_content(mut self, include: bool) -> Self {
        self.include_content = include;
        self
    }

    /// Restrict to extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to paths containing `filter`
    pub fn with_path_filter(mut self, filter: impl Into<String>) -> Self {
        self.path_filter = Some(filter.into());
        self
    }

    /// Exclude paths containing any of `patterns`
    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_paths = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Reject unusable options
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(SearchError::Validation(
                "limit must be greater than zero".to_string(),
            ));
        }
        if self.file_extensions.iter().any(|e| e.trim_start_matches('.').is_empty()) {
            return Err(SearchError::Validation(
                "file extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a path passes every filter
    pub fn accepts(&self, path: &str) -> bool {
        if !self.file_extensions.is_empty() {
            let lower = path.to_lowercase();
            let allowed = self.file_extensions.iter().any(|ext| {
                let ext = ext.trim_start_matches('.').to_lowercase();
                lower.ends_with(&format!(".{ext}"))
            });
            if !allowed {
                return false;
            }
        }

        if let Some(filter) = &self.path_filter {
            if !filter.is_empty() && !path.contains(filter.as_str()) {
                return false;
            }
        }

        !self
            .exclude_paths
            .iter()
            .any(|pattern| !pattern.is_empty() && path.contains(pattern.as_str()))
    }
}

/// Validate and trim a query string
pub fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(SearchError::Validation(
            "query must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Whether the index held anything to search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    /// No files are indexed; distinct from an empty result set
    NotIndexed,

    /// The query ran against a populated index
    Ok,
}

/// One ranked file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// File path
    pub path: String,

    /// Cosine similarity
    pub score: f64,

    /// File content, when requested and stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Index state at query time
    pub state: SearchState,

    /// Ranked results, best first
    pub results: Vec<SearchResult>,
}

impl SearchOutcome {
    /// Outcome for an empty index
    pub fn not_indexed() -> Self {
        Self {
            state: SearchState::NotIndexed,
            results: Vec::new(),
        }
    }

    /// Whether the index was empty
    pub fn is_not_indexed(&self) -> bool {
        self.state == SearchState::NotIndexed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("src/app.ts", true)]
    #[case("src/app.TS", true)]
    #[case("src/app.rs", false)]
    #[case("src/ts", false)]
    fn test_extension_filter(#[case] path: &str, #[case] expected: bool) {
        let options = SearchOptions::default().with_extensions(["ts", ".tsx"]);
        assert_eq!(options.accepts(path), expected);
    }

    #[test]
    fn test_path_and_exclude_filters() {
        let options = SearchOptions::default()
            .with_path_filter("src/")
            .with_excludes(["generated"]);
        assert!(options.accepts("src/lib.rs"));
        assert!(!options.accepts("tests/lib.rs"));
        assert!(!options.accepts("src/generated/api.rs"));
    }

    #[test]
    fn test_validation() {
        assert!(SearchOptions::default().validate().is_ok());
        assert!(SearchOptions::default().with_limit(0).validate().is_err());
        assert!(SearchOptions::default()
            .with_extensions(["."])
            .validate()
            .is_err());
        assert!(validate_query("  \t").is_err());
        assert_eq!(validate_query("  parse tokens ").unwrap(), "parse tokens");
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&SearchOutcome::not_indexed()).unwrap();
        assert_eq!(json, r#"{"state":"not_indexed","results":[]}"#);
    }
}
