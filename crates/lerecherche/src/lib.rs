// lerecherche - Search Service
//
// *La Recherche* (The Search) - Incremental TF-IDF indexing and cosine-ranked
// file search over the index store

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Candidate files and the enumerator seam.
pub mod enumerator;
/// Search service errors.
pub mod error;
/// Options, validation and result shapes.
pub mod query;
/// IDF and cosine similarity.
pub mod ranking;
/// The search service.
pub mod search;
/// Weighted term vectors.
pub mod vector;

pub use enumerator::{CandidateFile, FileEnumerator, InMemoryEnumerator};
pub use error::{Result, SearchError};
pub use query::{SearchOptions, SearchOutcome, SearchResult, SearchState, DEFAULT_LIMIT};
pub use search::{FileFailure, IndexStatus, ReindexStats, SearchService, ServiceConfig};
pub use vector::TermVector;

/// Search library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
