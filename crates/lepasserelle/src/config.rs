// Project Configuration
//
// *La Configuration* (The Configuration) - Project settings for Lexique

use anyhow::{Context, Result};
use lejeton::TokenizerConfig;
use lerecherche::{ServiceConfig, DEFAULT_LIMIT};
use lestockage::StoreConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding project-local Lexique state
pub const CONFIG_DIR: &str = ".lexique";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".lexique/config.toml";

/// Extension -> language table used for detection and filtering
const LANGUAGES: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("py", "python"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("go", "go"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("cxx", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("rb", "ruby"),
    ("php", "php"),
    ("lua", "lua"),
    ("scala", "scala"),
    ("swift", "swift"),
    ("sh", "shell"),
    ("sql", "sql"),
    ("md", "markdown"),
    ("toml", "toml"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("json", "json"),
];

/// Language name for a file extension, if known
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_lowercase();
    LANGUAGES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Language filtering settings
    pub languages: LanguageConfig,

    /// Path exclusion patterns
    pub exclusions: ExclusionConfig,

    /// Tokenizer settings, shared by indexing and querying
    pub tokenizer: TokenizerConfig,

    /// Index store settings
    pub storage: StorageConfig,

    /// Indexing behaviour
    pub index: IndexConfig,
}

impl ProjectConfig {
    /// Load configuration from a directory
    ///
    /// Looks for `.lexique/config.toml` in the project directory.
    /// If not found, returns default configuration.
    pub fn load<P: AsRef<Path>>(project_path: P) -> Result<Self> {
        let config_path = project_path.as_ref().join(DEFAULT_CONFIG_FILE);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        Ok(config)
    }

    /// Save configuration to a directory
    ///
    /// Creates `.lexique` if it doesn't exist. Returns the written path.
    pub fn save<P: AsRef<Path>>(&self, project_path: P) -> Result<PathBuf> {
        let config_dir = project_path.as_ref().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

        let config_path = config_dir.join("config.toml");

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(&config_path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(config_path)
    }

    /// Absolute path of the index database for a project
    pub fn db_path<P: AsRef<Path>>(&self, project_path: P) -> PathBuf {
        project_path
            .as_ref()
            .join(CONFIG_DIR)
            .join(&self.storage.db_file)
    }

    /// Index store settings
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            wal_enabled: self.storage.wal_enabled,
            cache_size_pages: self.storage.cache_size_pages,
            busy_timeout_ms: self.storage.busy_timeout_ms,
        }
    }

    /// Search service settings
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            auto_reindex: self.index.auto_reindex,
            store_content: self.index.store_content,
        }
    }

    /// Tokenizer settings with the input cap aligned to the file size cap
    pub fn tokenizer_config(&self) -> TokenizerConfig {
        let mut config = self.tokenizer.clone();
        config.max_input_bytes = config.max_input_bytes.max(self.index.max_file_bytes as usize);
        config
    }

    /// Check if a project-relative path should be excluded
    pub fn should_exclude(&self, relative_path: &str) -> bool {
        self.exclusions.should_exclude(relative_path)
    }
}

/// Language filtering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LanguageConfig {
    /// Accept every known extension
    pub enable_all: bool,

    /// Explicitly enabled languages (by extension or name)
    pub enabled: Vec<String>,

    /// Explicitly disabled languages (by extension or name)
    pub disabled: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            enable_all: true,
            enabled: Vec::new(),
            disabled: Vec::new(),
        }
    }
}

impl LanguageConfig {
    fn expand(names: &[String]) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for name in names {
            let name = name.trim_start_matches('.').to_lowercase();
            let by_language: Vec<_> = LANGUAGES
                .iter()
                .filter(|(_, lang)| *lang == name)
                .map(|(ext, _)| ext.to_string())
                .collect();
            if by_language.is_empty() {
                out.insert(name);
            } else {
                out.extend(by_language);
            }
        }
        out
    }

    /// Enabled file extensions
    pub fn enabled_extensions(&self) -> BTreeSet<String> {
        let disabled = Self::expand(&self.disabled);
        let base = if self.enable_all {
            LANGUAGES.iter().map(|(ext, _)| ext.to_string()).collect()
        } else {
            Self::expand(&self.enabled)
        };
        base.difference(&disabled).cloned().collect()
    }

    /// Check if a file extension is enabled
    pub fn is_extension_enabled(&self, ext: &str) -> bool {
        self.enabled_extensions().contains(&ext.to_lowercase())
    }
}

/// Path exclusion configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExclusionConfig {
    /// Directory name patterns to exclude
    pub directory_patterns: Vec<StringPattern>,

    /// File name patterns to exclude
    pub file_patterns: Vec<StringPattern>,

    /// Full relative path patterns to exclude
    pub path_patterns: Vec<StringPattern>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            directory_patterns: vec![
                ".git".into(),
                ".hg".into(),
                ".svn".into(),
                CONFIG_DIR.into(),
                "target".into(),
                "node_modules".into(),
                "vendor".into(),
                "dist".into(),
                "build".into(),
                ".venv".into(),
                "venv".into(),
                "__pycache__".into(),
            ],
            file_patterns: vec![
                "*.min.js".into(),
                "*.min.css".into(),
                "*.lock".into(),
                "package-lock.json".into(),
            ],
            path_patterns: Vec::new(),
        }
    }
}

impl ExclusionConfig {
    /// Check if a `/`-separated relative path should be excluded
    pub fn should_exclude(&self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').collect();
        let (file_name, dirs) = match segments.split_last() {
            Some((last, dirs)) => (*last, dirs),
            None => return false,
        };

        if dirs
            .iter()
            .any(|dir| self.directory_patterns.iter().any(|p| p.matches(dir)))
        {
            return true;
        }

        if self.file_patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }

        self.path_patterns.iter().any(|p| p.matches(path))
    }

    /// Check if a directory name is excluded
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.directory_patterns.iter().any(|p| p.matches(name))
    }
}

/// String pattern for matching (supports `*` wildcards)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub struct StringPattern {
    /// The pattern string, which may contain wildcards
    pub pattern: String,
}

impl From<&str> for StringPattern {
    fn from(s: &str) -> Self {
        Self {
            pattern: s.to_string(),
        }
    }
}

impl From<String> for StringPattern {
    fn from(s: String) -> Self {
        Self { pattern: s }
    }
}

impl From<StringPattern> for String {
    fn from(p: StringPattern) -> Self {
        p.pattern
    }
}

impl StringPattern {
    /// Check if this pattern matches the whole of `text`
    pub fn matches(&self, text: &str) -> bool {
        if !self.pattern.contains('*') {
            return self.pattern == text;
        }

        let parts: Vec<&str> = self.pattern.split('*').collect();
        let (first, rest) = match parts.split_first() {
            Some(split) => split,
            None => return true,
        };
        if !text.starts_with(first) {
            return false;
        }

        let mut remaining = &text[first.len()..];
        for (i, part) in rest.iter().enumerate() {
            let is_last = i == rest.len() - 1;
            if is_last {
                return remaining.ends_with(part);
            }
            if part.is_empty() {
                continue;
            }
            match remaining.find(part) {
                Some(pos) => remaining = &remaining[pos + part.len()..],
                None => return false,
            }
        }
        true
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file name inside `.lexique/`
    pub db_file: String,

    /// Whether to enable WAL mode
    pub wal_enabled: bool,

    /// Cache size in pages
    pub cache_size_pages: Option<i64>,

    /// Lock wait in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            db_file: "index.db".to_string(),
            wal_enabled: store.wal_enabled,
            cache_size_pages: store.cache_size_pages,
            busy_timeout_ms: store.busy_timeout_ms,
        }
    }
}

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexConfig {
    /// Files larger than this are skipped by the walker
    pub max_file_bytes: u64,

    /// Reindex automatically when searching an empty index
    pub auto_reindex: bool,

    /// Store file content so search can return it
    pub store_content: bool,

    /// Result limit when none is given
    pub default_limit: usize,

    /// Follow symbolic links while walking
    pub follow_links: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            auto_reindex: true,
            store_content: true,
            default_limit: DEFAULT_LIMIT,
            follow_links: false,
        }
    }
}
