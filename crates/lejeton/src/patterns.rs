// Pattern tables
//
// Everything the pipeline classifies against lives here as data: regex
// patterns in precedence order, the technical vocabulary, stop words and the
// morpheme dictionary used for compound splitting.

use crate::token::TokenType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// A recognizer that claims a span of input as a single typed token.
pub struct PatternRule {
    /// Type assigned to matches
    pub token_type: TokenType,

    /// Compiled pattern; capture group 1, when present, is the token text
    pub regex: Regex,
}

/// Recognizers in precedence order. Earlier rules win overlapping spans.
pub static PATTERN_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule {
            token_type: TokenType::Url,
            regex: Regex::new(r#"(?i)\b[a-z][a-z0-9+.\-]*://[^\s<>"'`()\[\]{}]+"#)
                .expect("url pattern"),
        },
        PatternRule {
            token_type: TokenType::Email,
            regex: Regex::new(r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b")
                .expect("email pattern"),
        },
        PatternRule {
            token_type: TokenType::Version,
            regex: Regex::new(r"\b[vV]?\d+\.\d+\.\d+\b").expect("version pattern"),
        },
        PatternRule {
            token_type: TokenType::Method,
            regex: Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\(")
                .expect("method pattern"),
        },
    ]
});

/// Trailing punctuation stripped from URL matches.
pub const URL_TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Keywords that look like `name(` but are control flow, not calls.
pub static CALL_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "if", "for", "while", "switch", "catch", "return", "function", "fn", "match",
        "typeof", "sizeof", "elif", "with", "until", "unless", "foreach", "lambda",
    ]
    .into_iter()
    .collect()
});

/// Curated technical abbreviations (protocols, formats, platforms).
pub static TECHNICAL_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Protocols and networking
        "api", "http", "https", "tcp", "udp", "ip", "dns", "ssh", "ssl", "tls", "ftp", "smtp",
        "grpc", "rpc", "rest", "graphql", "websocket", "ws", "cors", "csrf", "xss", "oauth",
        "jwt", "url", "uri", "mcp",
        // Formats and encodings
        "json", "xml", "yaml", "yml", "toml", "csv", "html", "css", "sql", "pdf", "png",
        "jpeg", "jpg", "svg", "utf", "utf8", "ascii", "uuid", "regex", "md",
        // Platforms and tooling
        "cli", "gui", "ui", "ux", "sdk", "ide", "db", "orm", "crud", "cpu", "gpu", "ram",
        "io", "os", "npm", "git", "ci", "k8s", "aws", "gcp", "wasm", "ast", "llm", "ai",
        "ml", "tty", "env", "id",
    ]
    .into_iter()
    .collect()
});

/// Articles, conjunctions, prepositions and auxiliaries.
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Articles
        "a", "an", "the",
        // Conjunctions
        "and", "or", "but", "nor", "so", "yet", "if", "than", "then", "because", "while",
        "whereas", "although",
        // Prepositions
        "of", "in", "on", "at", "to", "for", "from", "by", "with", "about", "as", "into",
        "onto", "upon", "over", "under", "between", "through", "during", "before", "after",
        "above", "below", "within", "without", "against", "among", "around", "via", "per",
        // Auxiliaries and demonstratives
        "is", "are", "was", "were", "be", "been", "being", "it", "its", "this", "that",
        "these", "those", "there",
    ]
    .into_iter()
    .collect()
});

/// Morphemes recognised when splitting concatenated lowercase words.
pub static MORPHEMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "file", "name", "path", "user", "data", "base", "time", "stamp", "type", "list",
        "map", "key", "value", "node", "tree", "index", "cache", "store", "config", "load",
        "save", "read", "write", "get", "set", "make", "build", "parse", "token", "text",
        "line", "word", "count", "size", "table", "row", "column", "query", "search",
        "result", "error", "handler", "manager", "service", "server", "client", "request",
        "response", "event", "message", "queue", "stream", "buffer", "pool", "thread",
        "task", "job", "work", "worker", "flow", "input", "output", "source", "target",
        "test", "case", "check", "update", "delete", "create", "init", "start", "end",
        "stop", "open", "close", "back", "front", "page", "view", "model", "state", "hash",
        "code", "block", "date", "pass", "host", "port", "point", "down", "space", "book",
        "mark", "frame", "call", "hook", "sort", "filter", "field",
    ]
    .into_iter()
    .collect()
});

/// Words longer than this are never dictionary-split.
pub const MAX_COMPOUND_LEN: usize = 40;

/// Check whether a lowercase term is a technical abbreviation.
pub fn is_technical(term: &str) -> bool {
    TECHNICAL_TERMS.contains(term)
}

/// Check whether a lowercase term is a stop word.
pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(term)
}

/// Split a lowercase word into known morphemes.
///
/// Returns `None` unless the whole word is covered by at least two
/// morphemes. Among full covers the one with the fewest parts wins, ties
/// going to the earliest split point.
pub fn split_morphemes(word: &str) -> Option<Vec<&str>> {
    if word.len() > MAX_COMPOUND_LEN || !word.is_ascii() {
        return None;
    }

    let n = word.len();
    // best[i] = (parts, previous boundary) for the prefix word[..i]
    let mut best: Vec<Option<(usize, usize)>> = vec![None; n + 1];
    best[0] = Some((0, 0));

    for end in 1..=n {
        for start in 0..end {
            let Some((parts, _)) = best[start] else {
                continue;
            };
            if !MORPHEMES.contains(&word[start..end]) {
                continue;
            }
            let candidate = parts + 1;
            match best[end] {
                Some((existing, _)) if existing <= candidate => {}
                _ => best[end] = Some((candidate, start)),
            }
        }
    }

    let (parts, _) = best[n]?;
    if parts < 2 {
        return None;
    }

    let mut pieces = Vec::with_capacity(parts);
    let mut end = n;
    while end > 0 {
        let (_, start) = best[end]?;
        pieces.push(&word[start..end]);
        end = start;
    }
    pieces.reverse();
    Some(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_in_precedence_order() {
        let order: Vec<TokenType> = PATTERN_RULES.iter().map(|r| r.token_type).collect();
        assert_eq!(
            order,
            vec![TokenType::Url, TokenType::Email, TokenType::Version, TokenType::Method]
        );
    }

    #[test]
    fn test_split_morphemes() {
        assert_eq!(split_morphemes("filename"), Some(vec!["file", "name"]));
        assert_eq!(split_morphemes("database"), Some(vec!["data", "base"]));
        assert_eq!(split_morphemes("timestamp"), Some(vec!["time", "stamp"]));
        assert_eq!(split_morphemes("file"), None);
        assert_eq!(split_morphemes("banana"), None);
    }

    #[test]
    fn test_vocabulary_lookups() {
        assert!(is_technical("json"));
        assert!(!is_technical("banana"));
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("function"));
    }
}
