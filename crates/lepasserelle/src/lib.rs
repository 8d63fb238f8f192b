// lepasserelle - Bridge & Integration
//
// *La Passerelle* (The Bridge) - Project configuration, filesystem walker
// and command-line front end over the search service

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Command-line interface
pub mod cli;

/// Project configuration (`.lexique/config.toml`)
pub mod config;

/// User-facing error types
pub mod errors;

/// Per-project orchestration
pub mod lexique;

/// Filesystem enumeration
pub mod walker;

pub use config::{ProjectConfig, CONFIG_DIR, DEFAULT_CONFIG_FILE};
pub use errors::{format_error, LexiqueError, Result};
pub use lexique::{Diagnostics, Lexique};
pub use walker::WalkdirEnumerator;

/// Bridge library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
