// lexique - Core Orchestration
//
// *Le Lexique* (The Lexicon) - Unified API wiring config, walker, store and
// search service for one project

use crate::config::{ProjectConfig, CONFIG_DIR};
use crate::errors::{LexiqueError, Result};
use crate::walker::WalkdirEnumerator;
use lejeton::Tokenizer;
use lerecherche::{IndexStatus, ReindexStats, SearchOptions, SearchOutcome, SearchService};
use lestockage::{HealthStatus, IndexStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Lexique - Main orchestration struct
///
/// Owns one project's search service. Cheap to clone; clones share the same
/// store handle.
///
/// # Example
///
/// ```ignore
/// let lexique = Lexique::open("/path/to/project")?;
/// lexique.index(false)?;
/// let outcome = lexique.search("parse config", &SearchOptions::default())?;
/// ```
#[derive(Clone)]
pub struct Lexique {
    /// Canonical project path
    project_path: PathBuf,

    /// Loaded project configuration
    config: ProjectConfig,

    /// Search service over the project's store
    service: Arc<SearchService>,
}

/// Diagnostics for one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Absolute project path
    pub project_path: String,

    /// Database file path
    pub db_path: String,

    /// Index summary
    pub status: IndexStatus,

    /// Store health
    pub health: HealthStatus,
}

impl Lexique {
    /// Open a project with its `.lexique/config.toml` (or defaults)
    pub fn open<P: AsRef<Path>>(project_path: P) -> Result<Self> {
        let project_path = canonical(project_path.as_ref())?;
        let config = ProjectConfig::load(&project_path).map_err(|e| {
            LexiqueError::config_error(
                format!("{:#}", e),
                Some("Fix or remove .lexique/config.toml; `lexique init-config` writes defaults.".to_string()),
            )
        })?;
        Self::with_config(project_path, config)
    }

    /// Open a project with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(project_path: P, config: ProjectConfig) -> Result<Self> {
        let project_path = canonical(project_path.as_ref())?;
        let state_dir = project_path.join(CONFIG_DIR);
        fs::create_dir_all(&state_dir).map_err(|e| {
            LexiqueError::io_error("Failed to create state directory", Some(state_dir.clone()), e)
        })?;

        let db_path = config.db_path(&project_path);
        let store = IndexStore::open_with_config(&db_path, config.store_config())?;
        store.initialize()?;

        let enumerator = WalkdirEnumerator::from_config(&project_path, &config);
        let service = SearchService::new(
            Arc::new(store),
            Arc::new(enumerator),
            Tokenizer::new(config.tokenizer_config()),
        )
        .with_config(config.service_config());

        info!("Opened project {}", project_path.display());
        Ok(Self {
            project_path,
            config,
            service: Arc::new(service),
        })
    }

    /// Project path
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Loaded configuration
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// The search service
    pub fn service(&self) -> &Arc<SearchService> {
        &self.service
    }

    /// Reindex the project; `force` clears the index first
    pub fn index(&self, force: bool) -> Result<ReindexStats> {
        if force {
            info!("Forced reindex: clearing index");
            self.service.clear_index()?;
        }
        Ok(self.service.reindex()?)
    }

    /// Search the project
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchOutcome> {
        Ok(self.service.search(query, options)?)
    }

    /// Empty the index
    pub fn clear(&self) -> Result<()> {
        Ok(self.service.clear_index()?)
    }

    /// Store health; never fails
    pub fn health(&self) -> HealthStatus {
        self.service.health_check()
    }

    /// Index summary
    pub fn status(&self) -> Result<IndexStatus> {
        Ok(self.service.status()?)
    }

    /// Status and health together
    pub fn diagnostics(&self) -> Result<Diagnostics> {
        Ok(Diagnostics {
            project_path: self.project_path.display().to_string(),
            db_path: self.config.db_path(&self.project_path).display().to_string(),
            status: self.status()?,
            health: self.health(),
        })
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| {
        LexiqueError::io_error(
            "Failed to canonicalize project path",
            Some(path.to_path_buf()),
            e,
        )
    })
}
