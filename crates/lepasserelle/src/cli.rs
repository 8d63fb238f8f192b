// CLI Interface
//
// This module provides the command-line interface for Lexique.

use crate::config::ProjectConfig;
use crate::errors::{format_error, LexiqueError};
use crate::lexique::Lexique;
use anyhow::{Context, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use lerecherche::{IndexStatus, ReindexStats, SearchOptions, SearchOutcome, SearchState};
use lestockage::HealthStatus;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Lexique - TF-IDF code relevance search
#[derive(Parser, Debug)]
#[command(name = "lexique")]
#[command(author = "Lexique Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Index a codebase and rank its files against free-text queries", long_about = None)]
pub struct Cli {
    /// Path to the project directory
    #[arg(global = true, long = "project", short = 'p')]
    pub project_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index (or incrementally reindex) the project
    Index {
        /// Clear the index and rebuild from scratch
        #[arg(long = "force")]
        force: bool,

        /// Print statistics as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Rank indexed files against a query
    Search {
        /// Search query
        #[arg(value_name = "QUERY")]
        query: String,

        /// Maximum number of results to return
        #[arg(long = "limit", short = 'n')]
        limit: Option<usize>,

        /// Only files with this extension (repeatable)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Only paths containing this text
        #[arg(long = "path", value_name = "TEXT")]
        path_filter: Option<String>,

        /// Skip paths containing this text (repeatable)
        #[arg(long = "exclude", value_name = "TEXT")]
        exclude: Vec<String>,

        /// Include file content in results
        #[arg(long = "content")]
        content: bool,

        /// Print the outcome as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Remove every indexed row, keeping the schema
    Clear,

    /// Check index store health
    Health {
        /// Print as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Show index statistics
    Status {
        /// Print as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Write the default configuration to .lexique/config.toml
    InitConfig {
        /// Overwrite an existing file
        #[arg(long = "force")]
        force: bool,
    },
}

impl Cli {
    /// Run the CLI
    pub async fn run(self) -> AnyhowResult<()> {
        init_logging_impl(self.verbose);

        let project = get_project_path(self.project_path)?;

        match self.command {
            Commands::Index { force, json } => cmd_index_impl(project, force, json).await,
            Commands::Search {
                query,
                limit,
                extensions,
                path_filter,
                exclude,
                content,
                json,
            } => {
                let request = SearchRequest {
                    query,
                    limit,
                    extensions,
                    path_filter,
                    exclude,
                    content,
                };
                cmd_search_impl(project, request, json).await
            }
            Commands::Clear => cmd_clear_impl(project).await,
            Commands::Health { json } => cmd_health_impl(project, json).await,
            Commands::Status { json } => cmd_status_impl(project, json).await,
            Commands::InitConfig { force } => cmd_init_config_impl(project, force),
        }
    }
}

/// Search arguments gathered from the command line
#[derive(Debug, Clone)]
struct SearchRequest {
    query: String,
    limit: Option<usize>,
    extensions: Vec<String>,
    path_filter: Option<String>,
    exclude: Vec<String>,
    content: bool,
}

impl SearchRequest {
    fn options(&self, config: &ProjectConfig) -> SearchOptions {
        let mut options = SearchOptions::default()
            .with_limit(self.limit.unwrap_or(config.index.default_limit))
            .with_content(self.content)
            .with_extensions(self.extensions.clone())
            .with_excludes(self.exclude.clone());
        if let Some(filter) = &self.path_filter {
            options = options.with_path_filter(filter.clone());
        }
        options
    }
}

/// Initialize logging implementation
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
fn init_logging_impl(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Get project path from explicit path or current directory
fn get_project_path(explicit: Option<PathBuf>) -> AnyhowResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// Open the project on a blocking thread and run `f` against it
async fn with_project<T, F>(project: PathBuf, f: F) -> Result<T, LexiqueError>
where
    T: Send + 'static,
    F: FnOnce(&Lexique) -> Result<T, LexiqueError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let lexique = Lexique::open(&project)?;
        f(&lexique)
    })
    .await
    .map_err(|e| LexiqueError::index_error(format!("Worker task failed: {}", e), false))?
}

/// Print a user-facing error and turn it into the command's failure
fn report(error: LexiqueError, json: bool) -> anyhow::Error {
    if json {
        println!(
            "{}",
            json!({
                "state": "error",
                "error": { "kind": error.kind(), "message": error.to_string() },
            })
        );
    } else {
        eprintln!("{}", format_error(&error));
    }
    anyhow::Error::new(error)
}

/// Index command implementation
async fn cmd_index_impl(project: PathBuf, force: bool, json: bool) -> AnyhowResult<()> {
    info!("Indexing project at: {}", project.display());

    let stats = with_project(project, move |lexique| lexique.index(force))
        .await
        .map_err(|e| report(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_index_stats(&stats);
    }
    Ok(())
}

fn print_index_stats(stats: &ReindexStats) {
    println!("\n✓ Indexing complete!");
    println!("  Added: {}", stats.added);
    println!("  Updated: {}", stats.updated);
    println!("  Removed: {}", stats.removed);
    println!("  Unchanged: {}", stats.unchanged);
    println!("  Failed: {}", stats.failed);
    for failure in &stats.failures {
        println!("    - {} ({}): {}", failure.path, failure.kind, failure.message);
    }
    println!("  IDF recomputed: {}", if stats.idf_recomputed { "yes" } else { "no" });
    println!("  Time: {}ms", stats.duration_ms);
}

/// Search command implementation
async fn cmd_search_impl(project: PathBuf, request: SearchRequest, json: bool) -> AnyhowResult<()> {
    info!("Searching for: {}", request.query);

    let query = request.query.clone();
    let outcome = with_project(project, move |lexique| {
        let options = request.options(lexique.config());
        lexique.search(&request.query, &options)
    })
    .await
    .map_err(|e| report(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&query, &outcome);
    }
    Ok(())
}

fn print_outcome(query: &str, outcome: &SearchOutcome) {
    if outcome.state == SearchState::NotIndexed {
        println!("Project is not indexed. Run 'lexique index' first.");
        return;
    }

    if outcome.results.is_empty() {
        println!("No results found for: {}", query);
        return;
    }

    println!("\nFound {} result(s) for: '{}'\n", outcome.results.len(), query);
    for (i, result) in outcome.results.iter().enumerate() {
        println!("{}. {} (score {:.4})", i + 1, result.path, result.score);
        if let Some(content) = &result.content {
            let preview: String = content.chars().take(200).collect();
            let ellipsis = if content.chars().count() > 200 { "..." } else { "" };
            println!("   {}{}", preview.replace('\n', "\n   "), ellipsis);
        }
    }
}

/// Clear command implementation
async fn cmd_clear_impl(project: PathBuf) -> AnyhowResult<()> {
    with_project(project, |lexique| lexique.clear())
        .await
        .map_err(|e| report(e, false))?;
    println!("✓ Index cleared");
    Ok(())
}

/// Health command implementation
async fn cmd_health_impl(project: PathBuf, json: bool) -> AnyhowResult<()> {
    let health = with_project(project, |lexique| Ok(lexique.health()))
        .await
        .map_err(|e| report(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&health)?);
    } else {
        print_health(&health);
    }

    if health.healthy {
        Ok(())
    } else {
        anyhow::bail!("index store is unhealthy")
    }
}

fn print_health(health: &HealthStatus) {
    if health.healthy {
        println!("✓ Index store healthy");
    } else {
        println!(
            "✗ Index store unhealthy: {}",
            health.error.as_deref().unwrap_or("unknown error")
        );
    }
    if let Some(details) = &health.details {
        println!("  Tables: {} (complete: {})", details.table_count, details.tables_exist);
        println!("  Cached files: {}", details.cached_files);
    }
}

/// Status command implementation
async fn cmd_status_impl(project: PathBuf, json: bool) -> AnyhowResult<()> {
    let diagnostics = with_project(project, |lexique| lexique.diagnostics())
        .await
        .map_err(|e| report(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        println!("Project: {}", diagnostics.project_path);
        println!("Database: {}", diagnostics.db_path);
        print_status(&diagnostics.status);
    }
    Ok(())
}

fn print_status(status: &IndexStatus) {
    println!("  Files: {}", status.files);
    println!("  Terms: {}", status.terms);
    println!("  IDF stale: {}", if status.idf_stale { "yes" } else { "no" });
    println!(
        "  Last indexed: {}",
        status.last_indexed_at.as_deref().unwrap_or("never")
    );
    if !status.schema_complete {
        println!("  Schema incomplete; run 'lexique clear' to repair");
    }
}

/// Init-config command implementation
fn cmd_init_config_impl(project: PathBuf, force: bool) -> AnyhowResult<()> {
    let target = project.join(crate::config::DEFAULT_CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }

    let written = ProjectConfig::default()
        .save(&project)
        .context("Failed to write default configuration")?;
    println!("✓ Wrote {}", written.display());
    Ok(())
}

/// Main entry point for the CLI
pub async fn main() -> AnyhowResult<()> {
    let cli = Cli::parse();
    cli.run().await
}
