// TF-IDF scoring
//
// *Le Classement* (The Ranking) - IDF computation and cosine similarity

use crate::vector::TermVector;
use lestockage::{IdfEntry, Posting};
use std::collections::{BTreeMap, HashMap};

/// Inverse document frequency, `ln(N / df)`.
///
/// A term present in every file scores 0. `df` of 0 (or an empty corpus) also
/// yields 0 rather than infinity.
pub fn idf(total_files: i64, document_frequency: i64) -> f64 {
    if total_files <= 0 || document_frequency <= 0 {
        return 0.0;
    }
    (total_files as f64 / document_frequency as f64).ln()
}

/// Compute the IDF table for a corpus from per-term document frequencies.
pub fn compute_idf(total_files: i64, frequencies: &BTreeMap<String, i64>) -> Vec<IdfEntry> {
    frequencies
        .iter()
        .map(|(term, df)| IdfEntry {
            term: term.clone(),
            idf_value: idf(total_files, *df),
        })
        .collect()
}

/// Cosine similarity of the query against every file appearing in `postings`.
///
/// `Σ q(t)·f(t)·idf(t)² / (|q|·|f|)` where the magnitudes are the raw
/// (un-weighted) L2 norms. Every file sharing at least one term gets an entry,
/// even when its score is 0 because all shared terms have zero IDF.
pub fn cosine_scores(
    query: &TermVector,
    postings: &[Posting],
    idf_values: &HashMap<String, f64>,
) -> HashMap<String, f64> {
    let mut dots: HashMap<&str, (f64, f64)> = HashMap::new();

    for posting in postings {
        let Some(query_weight) = query.weights.get(&posting.term) else {
            continue;
        };
        let idf = idf_values.get(&posting.term).copied().unwrap_or(0.0);
        let entry = dots
            .entry(posting.file_path.as_str())
            .or_insert((0.0, posting.magnitude));
        entry.0 += query_weight * posting.frequency * idf * idf;
    }

    dots.into_iter()
        .map(|(path, (dot, file_magnitude))| {
            let denominator = query.magnitude * file_magnitude;
            let score = if denominator > 0.0 { dot / denominator } else { 0.0 };
            (path.to_string(), score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(pairs: &[(&str, f64)]) -> TermVector {
        let weights: BTreeMap<String, f64> =
            pairs.iter().map(|(t, w)| (t.to_string(), *w)).collect();
        let magnitude = crate::vector::magnitude(&weights);
        TermVector { weights, magnitude }
    }

    fn posting(path: &str, term: &str, frequency: f64, magnitude: f64) -> Posting {
        Posting {
            file_path: path.to_string(),
            term: term.to_string(),
            frequency,
            magnitude,
        }
    }

    #[test]
    fn test_idf_values() {
        assert_eq!(idf(2, 2), 0.0);
        assert!((idf(2, 1) - std::f64::consts::LN_2).abs() < 1e-12);
        assert_eq!(idf(0, 0), 0.0);
        assert_eq!(idf(5, 0), 0.0);
    }

    #[test]
    fn test_compute_idf() {
        let mut df = BTreeMap::new();
        df.insert("export".to_string(), 2);
        df.insert("function".to_string(), 1);
        let entries = compute_idf(2, &df);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].term, "export");
        assert_eq!(entries[0].idf_value, 0.0);
        assert!(entries[1].idf_value > 0.0);
    }

    #[test]
    fn test_cosine_prefers_rare_shared_terms() {
        let query = vector(&[("export", 0.5), ("function", 0.5)]);
        let postings = vec![
            posting("a.ts", "export", 0.5, 1.0),
            posting("a.ts", "function", 0.5, 1.0),
            posting("b.ts", "export", 0.5, 1.0),
        ];
        let mut idf_values = HashMap::new();
        idf_values.insert("export".to_string(), 0.0);
        idf_values.insert("function".to_string(), std::f64::consts::LN_2);

        let scores = cosine_scores(&query, &postings, &idf_values);
        assert_eq!(scores.len(), 2);
        assert!(scores["a.ts"] > scores["b.ts"]);
        assert_eq!(scores["b.ts"], 0.0);
    }

    #[test]
    fn test_cosine_ignores_terms_outside_query() {
        let query = vector(&[("parser", 1.0)]);
        let postings = vec![posting("a.rs", "lexer", 1.0, 1.0)];
        let scores = cosine_scores(&query, &postings, &HashMap::new());
        assert!(scores.is_empty());
    }

    #[test]
    fn test_zero_magnitude_scores_zero() {
        let query = vector(&[("parser", 1.0)]);
        let postings = vec![posting("a.rs", "parser", 1.0, 0.0)];
        let mut idf_values = HashMap::new();
        idf_values.insert("parser".to_string(), 1.0);
        let scores = cosine_scores(&query, &postings, &idf_values);
        assert_eq!(scores["a.rs"], 0.0);
    }
}
