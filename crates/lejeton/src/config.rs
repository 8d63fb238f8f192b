// Tokenizer configuration

use serde::{Deserialize, Serialize};

/// Default minimum token length after normalisation.
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 2;

/// Default cap on the number of input bytes considered (1 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Options controlling which pipeline stages run and how output is normalised.
///
/// The same configuration must be used for indexing and for queries so that
/// both sides produce the same vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Keep original casing in token text instead of lowercasing
    pub preserve_case: bool,

    /// Tokens shorter than this (in chars) are dropped
    pub min_token_length: usize,

    /// Split camelCase, PascalCase and snake_case identifiers
    pub code_aware: bool,

    /// Retype curated abbreviations as technical terms
    pub extract_technical_terms: bool,

    /// Emit bigram and trigram tokens
    pub generate_ngrams: bool,

    /// Emit compound tokens for multi-morpheme identifiers
    pub detect_compounds: bool,

    /// Inputs longer than this are truncated at a char boundary
    pub max_input_bytes: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            preserve_case: false,
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            code_aware: true,
            extract_technical_terms: true,
            generate_ngrams: true,
            detect_compounds: true,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl TokenizerConfig {
    /// Set case preservation
    #[must_use]
    pub fn with_preserve_case(mut self, preserve: bool) -> Self {
        self.preserve_case = preserve;
        self
    }

    /// Set the minimum token length
    #[must_use]
    pub fn with_min_token_length(mut self, len: usize) -> Self {
        self.min_token_length = len;
        self
    }

    /// Enable or disable identifier splitting
    #[must_use]
    pub fn with_code_aware(mut self, enabled: bool) -> Self {
        self.code_aware = enabled;
        self
    }

    /// Enable or disable technical-term detection
    #[must_use]
    pub fn with_technical_terms(mut self, enabled: bool) -> Self {
        self.extract_technical_terms = enabled;
        self
    }

    /// Enable or disable n-gram generation
    #[must_use]
    pub fn with_ngrams(mut self, enabled: bool) -> Self {
        self.generate_ngrams = enabled;
        self
    }

    /// Enable or disable compound detection
    #[must_use]
    pub fn with_compounds(mut self, enabled: bool) -> Self {
        self.detect_compounds = enabled;
        self
    }

    /// Set the input size cap in bytes
    #[must_use]
    pub fn with_max_input_bytes(mut self, bytes: usize) -> Self {
        self.max_input_bytes = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TokenizerConfig::default();
        assert!(!config.preserve_case);
        assert_eq!(config.min_token_length, 2);
        assert!(config.code_aware);
        assert!(config.extract_technical_terms);
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: TokenizerConfig =
            serde_json::from_str(r#"{"preserve_case": true}"#).unwrap();
        assert!(config.preserve_case);
        assert_eq!(config.min_token_length, DEFAULT_MIN_TOKEN_LENGTH);
        assert_eq!(config.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
    }
}
