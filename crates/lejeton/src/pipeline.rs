// Tokenization pipeline stages
//
// Each stage is a plain function over a `Draft` stream so it can be exercised
// on its own. `Tokenizer::tokenize` chains them in this order:
//
//   recognize_patterns -> segment -> decompose_identifiers -> mark_technical_terms
//   -> remove_stop_words -> filter_by_length -> detect_compounds -> generate_ngrams
//   -> score -> finalize

use crate::patterns::{
    is_stop_word, is_technical, split_morphemes, CALL_KEYWORDS, PATTERN_RULES,
    URL_TRAILING_PUNCTUATION,
};
use crate::token::{CaseType, Token, TokenFeatures, TokenType};
use std::collections::{HashMap, HashSet};

/// Minimum score of pattern-recognised tokens.
pub const PATTERN_SCORE_FLOOR: f32 = 0.7;

/// Minimum score of technical terms.
pub const TECHNICAL_SCORE_FLOOR: f32 = 0.75;

/// N-grams score this fraction of their weakest constituent.
pub const NGRAM_DAMPING: f32 = 0.6;

/// Separator joining n-gram constituents.
pub const NGRAM_SEPARATOR: &str = "_";

/// Content tokens needed before any n-gram is produced.
pub const NGRAM_MIN_TOKENS: usize = 3;

/// A slice of input after pattern recognition.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    /// Span claimed by a recognizer
    Pattern {
        /// Recognised type
        token_type: TokenType,
        /// Token text (may be a sub-span of the match, e.g. a method name)
        text: &'a str,
    },

    /// Unclaimed text left for generic splitting
    Text(&'a str),
}

/// A token under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    /// Current text
    pub text: String,

    /// Current classification
    pub token_type: TokenType,

    /// Casing of the text this draft came from
    pub case_type: CaseType,

    /// Identifier group shared by sub-words of one source word
    pub group: Option<usize>,

    /// Stream indices of n-gram constituents
    pub constituents: Vec<usize>,

    /// Score assigned by the scoring stage
    pub score: f32,

    /// Classification confidence assigned by the scoring stage
    pub confidence: f32,

    /// Occurrences of `text` in the stream
    pub frequency: u32,
}

impl Draft {
    /// Create an ungrouped draft.
    pub fn new(text: impl Into<String>, token_type: TokenType, case_type: CaseType) -> Self {
        Self {
            text: text.into(),
            token_type,
            case_type,
            group: None,
            constituents: Vec::new(),
            score: 0.0,
            confidence: 0.0,
            frequency: 0,
        }
    }

    fn grouped(mut self, group: usize) -> Self {
        self.group = Some(group);
        self
    }
}

fn normalize(text: &str, preserve_case: bool) -> String {
    if preserve_case {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Claim URL, email, version and method-call spans.
///
/// Rules run in precedence order and a span already claimed by an earlier
/// rule is never reclaimed. Unclaimed gaps come back as `Segment::Text`.
pub fn recognize_patterns(text: &str) -> Vec<Segment<'_>> {
    let mut claimed = vec![false; text.len()];
    // (span start, span end, token type, token text range)
    let mut spans: Vec<(usize, usize, TokenType, usize, usize)> = Vec::new();

    for rule in PATTERN_RULES.iter() {
        for caps in rule.regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let start = whole.start();
            let mut end = whole.end();
            let (mut text_start, mut text_end) = caps
                .get(1)
                .map(|m| (m.start(), m.end()))
                .unwrap_or((start, end));

            match rule.token_type {
                TokenType::Url => {
                    let trimmed = text[start..end].trim_end_matches(URL_TRAILING_PUNCTUATION);
                    end = start + trimmed.len();
                    text_start = start;
                    text_end = end;
                }
                TokenType::Method => {
                    let name = text[text_start..text_end].to_lowercase();
                    if CALL_KEYWORDS.contains(name.as_str()) {
                        continue;
                    }
                }
                _ => {}
            }

            if start >= end || claimed[start..end].iter().any(|taken| *taken) {
                continue;
            }
            claimed[start..end].iter_mut().for_each(|taken| *taken = true);
            spans.push((start, end, rule.token_type, text_start, text_end));
        }
    }

    spans.sort_by_key(|span| span.0);

    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;
    for (start, end, token_type, text_start, text_end) in spans {
        if cursor < start {
            segments.push(Segment::Text(&text[cursor..start]));
        }
        segments.push(Segment::Pattern {
            token_type,
            text: &text[text_start..text_end],
        });
        cursor = end;
    }
    if cursor < text.len() {
        segments.push(Segment::Text(&text[cursor..]));
    }
    segments
}

/// Split text segments into raw word candidates.
///
/// Word characters are Unicode alphanumerics and `_`. Pattern segments pass
/// through as single normalised drafts; plain words keep their original
/// casing so identifier decomposition can see the humps.
pub fn segment(segments: &[Segment<'_>], preserve_case: bool) -> Vec<Draft> {
    let mut drafts = Vec::new();

    for segment in segments {
        match segment {
            Segment::Pattern { token_type, text } => {
                drafts.push(Draft::new(
                    normalize(text, preserve_case),
                    *token_type,
                    CaseType::classify(text),
                ));
            }
            Segment::Text(text) => {
                for word in text.split(|c: char| !is_word_char(c)) {
                    if word.chars().any(char::is_alphanumeric) {
                        drafts.push(Draft::new(word, TokenType::Word, CaseType::classify(word)));
                    }
                }
            }
        }
    }

    drafts
}

/// Split an identifier on underscores and case humps.
///
/// `getUserData`, `GetUserData` and `get_user_data` all yield
/// `["get", "User", "Data"]`-shaped parts; acronyms stay together
/// (`HTTPServer` -> `HTTP`, `Server`).
pub fn split_identifier(word: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for chunk in word.split('_').filter(|chunk| !chunk.is_empty()) {
        split_case_humps(chunk, &mut parts);
    }
    parts
}

fn split_case_humps<'a>(chunk: &'a str, parts: &mut Vec<&'a str>) {
    let chars: Vec<(usize, char)> = chunk.char_indices().collect();
    let mut start = 0;

    for i in 1..chars.len() {
        let (idx, cur) = chars[i];
        let prev = chars[i - 1].1;
        let next = chars.get(i + 1).map(|(_, c)| *c);

        let lower_to_upper = cur.is_uppercase() && (prev.is_lowercase() || prev.is_numeric());
        let acronym_end =
            cur.is_uppercase() && prev.is_uppercase() && next.is_some_and(char::is_lowercase);

        if lower_to_upper || acronym_end {
            parts.push(&chunk[start..idx]);
            start = idx;
        }
    }
    parts.push(&chunk[start..]);
}

/// Decompose camelCase, PascalCase and snake_case words into sub-words.
///
/// Every word is normalised here. When `code_aware` is off, or a word has a
/// single part, it stays one `Word` draft.
pub fn decompose_identifiers(drafts: Vec<Draft>, code_aware: bool, preserve_case: bool) -> Vec<Draft> {
    let mut out = Vec::with_capacity(drafts.len());

    for (index, draft) in drafts.into_iter().enumerate() {
        if draft.token_type != TokenType::Word {
            out.push(draft);
            continue;
        }

        let parts = if code_aware {
            split_identifier(&draft.text)
        } else {
            Vec::new()
        };

        if parts.len() >= 2 {
            for part in parts {
                out.push(
                    Draft::new(normalize(part, preserve_case), TokenType::Identifier, draft.case_type)
                        .grouped(index),
                );
            }
        } else {
            let text = match parts.first() {
                Some(part) => normalize(part, preserve_case),
                None => normalize(&draft.text, preserve_case),
            };
            out.push(Draft { text, ..draft });
        }
    }

    out
}

/// Retype curated abbreviations as `Technical`.
pub fn mark_technical_terms(mut drafts: Vec<Draft>) -> Vec<Draft> {
    for draft in &mut drafts {
        if matches!(draft.token_type, TokenType::Word | TokenType::Identifier)
            && is_technical(&draft.text.to_lowercase())
        {
            draft.token_type = TokenType::Technical;
        }
    }
    drafts
}

/// Drop standalone stop words. Identifier sub-words are kept.
pub fn remove_stop_words(drafts: Vec<Draft>) -> Vec<Draft> {
    drafts
        .into_iter()
        .filter(|draft| {
            !(draft.token_type == TokenType::Word
                && draft.group.is_none()
                && is_stop_word(&draft.text.to_lowercase()))
        })
        .collect()
}

/// Drop drafts shorter than `min_len` chars.
pub fn filter_by_length(drafts: Vec<Draft>, min_len: usize) -> Vec<Draft> {
    drafts
        .into_iter()
        .filter(|draft| draft.text.chars().count() >= min_len)
        .collect()
}

/// Emit `Compound` drafts next to multi-morpheme identifiers.
///
/// Identifier groups with two or more surviving parts get a compound right
/// after their last part. Plain lowercase words fully covered by known
/// morphemes are split into their parts, followed by the compound. Parts are
/// always kept, and are cut from the same text as the compound so both share
/// its casing.
pub fn detect_compounds(drafts: Vec<Draft>) -> Vec<Draft> {
    let mut next_group = drafts
        .iter()
        .filter_map(|draft| draft.group)
        .max()
        .map_or(0, |group| group + 1);

    let mut out: Vec<Draft> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        if draft.group.is_none() && draft.token_type == TokenType::Word {
            let lowered = draft.text.to_lowercase();
            if let Some(parts) = split_morphemes(&lowered) {
                let case_type = draft.case_type;
                // Morphemes are ASCII, so offsets in `lowered` hold in `text`.
                let mut start = 0;
                for part in parts {
                    let end = start + part.len();
                    out.push(
                        Draft::new(&draft.text[start..end], TokenType::Word, case_type)
                            .grouped(next_group),
                    );
                    start = end;
                }
                out.push(Draft::new(draft.text, TokenType::Compound, case_type).grouped(next_group));
                next_group += 1;
                continue;
            }
        }
        out.push(draft);
    }

    close_identifier_runs(out)
}

fn close_identifier_runs(drafts: Vec<Draft>) -> Vec<Draft> {
    let mut out = Vec::with_capacity(drafts.len());
    let mut i = 0;

    while i < drafts.len() {
        let group = drafts[i].group;
        let mut j = i + 1;
        while group.is_some() && j < drafts.len() && drafts[j].group == group {
            j += 1;
        }

        let run = &drafts[i..j];
        out.extend(run.iter().cloned());

        let is_identifier_run = run
            .iter()
            .all(|draft| matches!(draft.token_type, TokenType::Identifier | TokenType::Technical));
        if group.is_some() && run.len() >= 2 && is_identifier_run {
            let text: String = run.iter().map(|draft| draft.text.as_str()).collect();
            out.push(Draft {
                group,
                ..Draft::new(text, TokenType::Compound, run[0].case_type)
            });
        }

        i = j;
    }

    out
}

/// Append bigram and trigram drafts over content tokens.
///
/// Content tokens are everything except n-grams and compounds. Fewer than
/// `NGRAM_MIN_TOKENS` content tokens produce nothing.
pub fn generate_ngrams(mut drafts: Vec<Draft>) -> Vec<Draft> {
    let content: Vec<usize> = drafts
        .iter()
        .enumerate()
        .filter(|(_, draft)| !draft.token_type.is_derived())
        .map(|(i, _)| i)
        .collect();

    if content.len() < NGRAM_MIN_TOKENS {
        return drafts;
    }

    for size in [2usize, 3] {
        for window in content.windows(size) {
            let text = window
                .iter()
                .map(|&i| drafts[i].text.as_str())
                .collect::<Vec<_>>()
                .join(NGRAM_SEPARATOR);
            let case_type = CaseType::classify(&text);
            let mut ngram = Draft::new(text, TokenType::Ngram, case_type);
            ngram.constituents = window.to_vec();
            drafts.push(ngram);
        }
    }

    drafts
}

fn type_confidence(token_type: TokenType) -> f32 {
    match token_type {
        TokenType::Url | TokenType::Email => 0.95,
        TokenType::Version | TokenType::Technical => 0.9,
        TokenType::Method => 0.85,
        TokenType::Identifier => 0.8,
        TokenType::Word => 0.7,
        TokenType::Compound => 0.6,
        TokenType::Ngram => 0.5,
    }
}

fn single_score(token_type: TokenType, frequency: u32, len: usize) -> f32 {
    let frequency_bonus = (0.02 * frequency.saturating_sub(1) as f32).min(0.1);
    let length_bonus = (0.005 * len as f32).min(0.05);
    let mut score = token_type.base_weight() + frequency_bonus + length_bonus;

    if token_type.is_pattern() {
        score = score.max(PATTERN_SCORE_FLOOR);
    }
    if token_type == TokenType::Technical {
        score = score.max(TECHNICAL_SCORE_FLOOR);
    }
    score.clamp(0.0, 1.0)
}

/// Assign frequency, score and confidence to every draft.
///
/// Single tokens combine their type weight with a frequency and length
/// bonus. N-grams take a damped fraction of their weakest constituent so they
/// always rank below it.
pub fn score(mut drafts: Vec<Draft>) -> Vec<Draft> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for draft in &drafts {
        *counts.entry(draft.text.as_str()).or_insert(0) += 1;
    }
    let frequencies: Vec<u32> = drafts
        .iter()
        .map(|draft| counts.get(draft.text.as_str()).copied().unwrap_or(1))
        .collect();

    for (draft, frequency) in drafts.iter_mut().zip(&frequencies) {
        draft.frequency = *frequency;
        draft.confidence = type_confidence(draft.token_type);
        if draft.token_type != TokenType::Ngram {
            draft.score = single_score(draft.token_type, *frequency, draft.text.chars().count());
        }
    }

    for i in 0..drafts.len() {
        if drafts[i].token_type != TokenType::Ngram {
            continue;
        }
        let weakest = drafts[i]
            .constituents
            .iter()
            .filter_map(|&c| drafts.get(c))
            .map(|constituent| constituent.score)
            .fold(1.0_f32, f32::min);
        drafts[i].score = (weakest * NGRAM_DAMPING).clamp(0.0, 1.0);
    }

    drafts
}

/// Deduplicate, assign positions and sort.
///
/// The first occurrence of each text wins. Positions follow emission order
/// of the surviving tokens; the output is stable-sorted by score descending
/// with ties broken by ascending position.
pub fn finalize(drafts: Vec<Draft>) -> Vec<Token> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut tokens: Vec<Token> = Vec::new();

    for draft in drafts {
        if !seen.insert(draft.text.clone()) {
            continue;
        }
        let has_numbers = draft.text.chars().any(char::is_numeric);
        let has_symbols = draft.text.chars().any(|c| !c.is_alphanumeric());
        let position = tokens.len();
        tokens.push(Token {
            text: draft.text,
            token_type: draft.token_type,
            score: draft.score,
            position,
            features: TokenFeatures {
                has_numbers,
                has_symbols,
                case_type: draft.case_type,
                frequency: draft.frequency,
                confidence: draft.confidence,
            },
        });
    }

    tokens.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.position.cmp(&b.position))
    });
    tokens
}
