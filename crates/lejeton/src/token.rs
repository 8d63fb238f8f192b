// Token data types

use serde::{Deserialize, Serialize};

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    /// Plain word
    Word,

    /// Sub-word of a decomposed identifier
    Identifier,

    /// Curated technical abbreviation (protocol, format, ...)
    Technical,

    /// Version string such as `v1.2.3`
    Version,

    /// Method call shape `name(`
    Method,

    /// URL with a scheme
    Url,

    /// Email address
    Email,

    /// Adjacent-token bigram or trigram
    Ngram,

    /// Whole multi-morpheme identifier emitted alongside its parts
    Compound,
}

impl TokenType {
    /// Base weight used by the scoring stage.
    pub fn base_weight(&self) -> f32 {
        match self {
            TokenType::Url | TokenType::Email => 0.9,
            TokenType::Technical | TokenType::Version => 0.85,
            TokenType::Method => 0.8,
            TokenType::Identifier => 0.6,
            TokenType::Word => 0.5,
            TokenType::Compound => 0.45,
            TokenType::Ngram => 0.35,
        }
    }

    /// Whether this type came out of pattern recognition and is never split.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            TokenType::Url | TokenType::Email | TokenType::Version | TokenType::Method
        )
    }

    /// Whether this is a derived multi-token type (n-gram or compound).
    pub fn is_derived(&self) -> bool {
        matches!(self, TokenType::Ngram | TokenType::Compound)
    }

    /// String form used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Word => "WORD",
            TokenType::Identifier => "IDENTIFIER",
            TokenType::Technical => "TECHNICAL",
            TokenType::Version => "VERSION",
            TokenType::Method => "METHOD",
            TokenType::Url => "URL",
            TokenType::Email => "EMAIL",
            TokenType::Ngram => "NGRAM",
            TokenType::Compound => "COMPOUND",
        }
    }
}

/// Casing style of the original text a token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    /// all lowercase letters
    Lower,
    /// ALL UPPERCASE letters
    Upper,
    /// Mixed upper and lower letters (camelCase, PascalCase)
    Camel,
    /// Underscore separated
    Snake,
    /// No letters at all
    Mixed,
}

impl CaseType {
    /// Classify a raw string.
    ///
    /// Precedence: mixed upper/lower, then underscores, then all upper, then
    /// all lower. Text without any cased letter is `Mixed`.
    pub fn classify(text: &str) -> Self {
        let has_upper = text.chars().any(char::is_uppercase);
        let has_lower = text.chars().any(char::is_lowercase);

        if has_upper && has_lower {
            CaseType::Camel
        } else if text.contains('_') {
            CaseType::Snake
        } else if has_upper {
            CaseType::Upper
        } else if has_lower {
            CaseType::Lower
        } else {
            CaseType::Mixed
        }
    }
}

/// Per-token features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenFeatures {
    /// Text contains a digit
    pub has_numbers: bool,

    /// Text contains a non-alphanumeric character
    pub has_symbols: bool,

    /// Casing of the original text
    pub case_type: CaseType,

    /// Occurrences of this text in the input
    pub frequency: u32,

    /// Certainty of the type classification (0-1)
    pub confidence: f32,
}

/// A typed, scored token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Normalised token text
    pub text: String,

    /// Token classification
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Relevance score in [0, 1]
    pub score: f32,

    /// 0-based emission position
    pub position: usize,

    /// Derived features
    pub features: TokenFeatures,
}

impl Token {
    /// Weight this token contributes to a term vector.
    pub fn weight(&self) -> f64 {
        f64::from(self.score) * f64::from(self.features.frequency.max(1))
    }
}
