// Term vectors
//
// *Le Vecteur* (The Vector) - Weighted term maps built from tokens

use lejeton::Token;
use std::collections::BTreeMap;

/// Weighted term map of one text, with its L2 norm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    /// Term -> raw weight (`score * frequency`)
    pub weights: BTreeMap<String, f64>,

    /// L2 norm of `weights`
    pub magnitude: f64,
}

impl TermVector {
    /// Build a vector from tokens.
    ///
    /// Tokens are expected to be deduplicated by text; should a text repeat,
    /// the first occurrence wins.
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut weights = BTreeMap::new();
        for token in tokens {
            weights
                .entry(token.text.clone())
                .or_insert_with(|| token.weight());
        }
        let magnitude = magnitude(&weights);
        Self { weights, magnitude }
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.weights.len()
    }

    /// Whether the vector holds no terms
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Terms as borrowed strings
    pub fn terms(&self) -> Vec<&str> {
        self.weights.keys().map(String::as_str).collect()
    }
}

/// L2 norm of a weight map
pub fn magnitude(weights: &BTreeMap<String, f64>) -> f64 {
    weights.values().map(|w| w * w).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lejeton::{tokenize, TokenizerConfig};

    #[test]
    fn test_magnitude() {
        let mut weights = BTreeMap::new();
        weights.insert("a".to_string(), 3.0);
        weights.insert("b".to_string(), 4.0);
        assert!((magnitude(&weights) - 5.0).abs() < 1e-12);
        assert_eq!(magnitude(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn test_from_tokens_weights_by_frequency() {
        let tokens = tokenize("parser parser parser lexer", &TokenizerConfig::default());
        let vector = TermVector::from_tokens(&tokens);

        let parser = tokens.iter().find(|t| t.text == "parser").unwrap();
        assert_eq!(parser.features.frequency, 3);
        assert!((vector.weights["parser"] - parser.score as f64 * 3.0).abs() < 1e-9);
        assert_eq!(vector.term_count(), tokens.len());
        assert!(vector.magnitude > 0.0);
    }

    #[test]
    fn test_empty_text_gives_empty_vector() {
        let vector = TermVector::from_tokens(&tokenize("   ", &TokenizerConfig::default()));
        assert!(vector.is_empty());
        assert_eq!(vector.magnitude, 0.0);
    }
}
