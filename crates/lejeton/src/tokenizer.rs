// Tokenizer entry point

use crate::config::TokenizerConfig;
use crate::pipeline;
use crate::token::Token;
use tracing::{trace, warn};
use unicode_normalization::UnicodeNormalization;

/// Code-aware tokenizer.
///
/// Holds a configuration and runs the pipeline stages in order. Tokenizing is
/// infallible: empty or whitespace-only input gives an empty vector, oversized
/// input is truncated.
///
/// # Example
///
/// ```
/// use lejeton::{Tokenizer, TokenType};
///
/// let tokens = Tokenizer::default().tokenize("parse the JSON config");
/// assert!(tokens.iter().any(|t| t.text == "json" && t.token_type == TokenType::Technical));
/// assert!(tokens.iter().all(|t| t.text != "the"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a tokenizer with the given configuration
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize text into typed, scored tokens sorted by score.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let text = self.prepare(text);
        if text.trim().is_empty() {
            return Vec::new();
        }

        let config = &self.config;

        let segments = pipeline::recognize_patterns(&text);
        let mut drafts = pipeline::segment(&segments, config.preserve_case);
        drafts = pipeline::decompose_identifiers(drafts, config.code_aware, config.preserve_case);
        if config.extract_technical_terms {
            drafts = pipeline::mark_technical_terms(drafts);
        }
        drafts = pipeline::remove_stop_words(drafts);
        drafts = pipeline::filter_by_length(drafts, config.min_token_length);
        if config.detect_compounds {
            drafts = pipeline::detect_compounds(drafts);
        }
        if config.generate_ngrams {
            drafts = pipeline::generate_ngrams(drafts);
        }
        drafts = pipeline::score(drafts);

        let tokens = pipeline::finalize(drafts);
        trace!("Tokenized {} bytes into {} tokens", text.len(), tokens.len());
        tokens
    }

    /// Truncate to the configured byte limit and apply NFKC normalisation.
    fn prepare(&self, text: &str) -> String {
        let limit = self.config.max_input_bytes;
        let text = if text.len() > limit {
            let mut end = limit;
            while end > 0 && !text.is_char_boundary(end) {
                end -= 1;
            }
            warn!(
                "Input of {} bytes exceeds tokenizer limit of {} bytes, truncating",
                text.len(),
                limit
            );
            &text[..end]
        } else {
            text
        };
        text.nfkc().collect()
    }
}

/// Tokenize with an explicit configuration.
pub fn tokenize(text: &str, config: &TokenizerConfig) -> Vec<Token> {
    Tokenizer::new(config.clone()).tokenize(text)
}
