// lejeton - Code-Aware Tokenizer
//
// *Le Jeton* (The Token) - Typed, scored tokens from prose and source code

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Tokenizer configuration.
pub mod config;
/// Data-driven pattern tables (URLs, technical terms, stop words, morphemes).
pub mod patterns;
/// Independent tokenization stages.
pub mod pipeline;
/// Token data types.
pub mod token;
/// Tokenizer entry point chaining the pipeline stages.
pub mod tokenizer;

pub use config::TokenizerConfig;
pub use token::{CaseType, Token, TokenFeatures, TokenType};
pub use tokenizer::{tokenize, Tokenizer};

/// Tokenizer library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
