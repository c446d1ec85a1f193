//! TF-IDF vectorization over a fixed text collection.
//!
//! [`TfidfVectorizer::fit_transform`] derives the vocabulary and inverse
//! document frequencies from exactly the texts passed in, then weights every
//! text against them. Nothing is cached between calls: the representation is
//! only meaningful within the matrix a single call returns, and is not
//! comparable across calls over different collections.
//!
//! # Weighting
//!
//! - Tokens: lowercase runs of two or more Unicode word characters.
//! - `tf(t, d)`: raw count of `t` in `d`.
//! - `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, with `n` the collection size
//!   and `df(t)` the number of texts containing `t`.
//! - Each row is L2-normalized. A text with no tokens stays the zero vector.
//!
//! Columns are assigned in sorted term order, so the layout of the matrix is
//! a pure function of the collection.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is valid"));

/// Split `text` into lowercase terms.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A sparse row of term weights, sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    /// Build from `(column, weight)` pairs. Pairs are sorted by column and
    /// zero weights are dropped.
    pub fn from_entries(mut entries: Vec<(usize, f32)>) -> Self {
        entries.retain(|(_, w)| *w != 0.0);
        entries.sort_by_key(|(col, _)| *col);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.entries.len() && j < other.entries.len() {
            let (ca, wa) = self.entries[i];
            let (cb, wb) = other.entries[j];
            match ca.cmp(&cb) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Exact squared Euclidean distance, merging both entry lists.
    pub fn squared_distance(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.entries.len() && j < other.entries.len() {
            let (ca, wa) = self.entries[i];
            let (cb, wb) = other.entries[j];
            match ca.cmp(&cb) {
                Ordering::Less => {
                    sum += wa * wa;
                    i += 1;
                }
                Ordering::Greater => {
                    sum += wb * wb;
                    j += 1;
                }
                Ordering::Equal => {
                    let d = wa - wb;
                    sum += d * d;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum += self.entries[i..].iter().map(|(_, w)| w * w).sum::<f32>();
        sum += other.entries[j..].iter().map(|(_, w)| w * w).sum::<f32>();
        sum
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Cosine similarity; `0.0` if either vector is zero.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let denom = self.norm() * other.norm();
        if denom < f32::EPSILON {
            return 0.0;
        }
        self.dot(other) / denom
    }
}

#[cfg(test)]
impl SparseVector {
    fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, column: usize) -> f32 {
        self.entries
            .binary_search_by_key(&column, |(col, _)| *col)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    fn to_dense(&self, dims: usize) -> Vec<f32> {
        let mut dense = vec![0.0f32; dims];
        for &(col, w) in &self.entries {
            dense[col] = w;
        }
        dense
    }
}

/// Output of a single [`TfidfVectorizer::fit_transform`] call.
#[derive(Debug, Clone, Default)]
pub struct TfidfMatrix {
    vocabulary: Vec<String>,
    rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    /// Number of columns (vocabulary size).
    pub fn dims(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }
}

#[cfg(test)]
impl TfidfMatrix {
    fn row(&self, i: usize) -> Option<&SparseVector> {
        self.rows.get(i)
    }

    fn column_of(&self, term: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|t| t.as_str().cmp(term))
            .ok()
    }

    fn to_dense_rows(&self) -> Vec<Vec<f32>> {
        let dims = self.dims();
        self.rows.iter().map(|r| r.to_dense(dims)).collect()
    }
}

/// Smoothed inverse document frequency of a term found in `df` of `n` texts.
pub fn smoothed_idf(n: usize, df: usize) -> f64 {
    ((1.0 + n as f64) / (1.0 + df as f64)).ln() + 1.0
}

/// Stateless TF-IDF vectorizer. Each call fits from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfidfVectorizer;

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self
    }

    /// Fit vocabulary and IDF on `texts` and return one weighted row per text.
    pub fn fit_transform<S: AsRef<str>>(&self, texts: &[S]) -> TfidfMatrix {
        let counts: Vec<HashMap<String, u32>> = texts
            .iter()
            .map(|t| {
                let mut tf: HashMap<String, u32> = HashMap::new();
                for token in tokenize(t.as_ref()) {
                    *tf.entry(token).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut doc_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for tf in &counts {
            for term in tf.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = texts.len();
        let vocabulary: Vec<String> = doc_freq.keys().map(|t| t.to_string()).collect();
        let idf: Vec<f64> = doc_freq
            .values()
            .map(|&df| smoothed_idf(n, df as usize))
            .collect();
        let columns: HashMap<&str, usize> = doc_freq
            .keys()
            .enumerate()
            .map(|(i, t)| (*t, i))
            .collect();

        let rows = counts
            .iter()
            .map(|tf| {
                let weighted: Vec<(usize, f64)> = tf
                    .iter()
                    .map(|(term, &count)| {
                        let col = columns[term.as_str()];
                        (col, count as f64 * idf[col])
                    })
                    .collect();
                let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                let entries = weighted
                    .into_iter()
                    .map(|(col, w)| (col, if norm > 0.0 { (w / norm) as f32 } else { 0.0 }))
                    .collect();
                SparseVector::from_entries(entries)
            })
            .collect();

        TfidfMatrix { vocabulary, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_drops_short_tokens() {
        let tokens = tokenize("Article 1. Contracts require a Mutual consent!");
        assert_eq!(tokens, vec!["article", "contracts", "require", "mutual", "consent"]);
    }

    #[test]
    fn test_tokenize_unicode_words() {
        let tokens = tokenize("Mülki Məcəllənin maddəsi");
        assert_eq!(tokens, vec!["mülki", "məcəllənin", "maddəsi"]);
    }

    #[test]
    fn test_empty_collection() {
        let m = TfidfVectorizer::new().fit_transform::<&str>(&[]);
        assert!(m.is_empty());
        assert_eq!(m.dims(), 0);
    }

    #[test]
    fn test_vocabulary_sorted_and_shared() {
        let m = TfidfVectorizer::new().fit_transform(&["beta alpha", "gamma alpha"]);
        assert_eq!(m.column_of("alpha"), Some(0));
        assert_eq!(m.column_of("gamma"), Some(2));
        assert_eq!(m.dims(), 3);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_smoothed_idf() {
        // Present everywhere: ln(4/4) + 1 = 1
        assert!((smoothed_idf(3, 3) - 1.0).abs() < 1e-12);
        // Present once in three: ln(4/2) + 1
        assert!((smoothed_idf(3, 1) - (2.0f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_rarer_term_weighs_more_in_same_row() {
        let m = TfidfVectorizer::new().fit_transform(&["court appeal", "court ruling", "court"]);
        let row = m.row(0).unwrap();
        let court = row.get(m.column_of("court").unwrap());
        let appeal = row.get(m.column_of("appeal").unwrap());
        let ratio = appeal / court;
        assert!((ratio - (2.0f64.ln() + 1.0) as f32).abs() < 1e-5);
    }

    #[test]
    fn test_rows_are_unit_length() {
        let m = TfidfVectorizer::new().fit_transform(&[
            "the tenant shall pay rent",
            "the landlord shall repair",
            "rent rent rent",
        ]);
        for row in m.rows() {
            assert!((row.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_absent_terms_have_zero_weight() {
        let m = TfidfVectorizer::new().fit_transform(&["penalty clause", "force majeure"]);
        let col = m.column_of("majeure").unwrap();
        assert_eq!(m.row(0).unwrap().get(col), 0.0);
        assert!(m.row(1).unwrap().get(col) > 0.0);
    }

    #[test]
    fn test_text_without_tokens_is_zero_vector() {
        let m = TfidfVectorizer::new().fit_transform(&["1 2 3 .", "statute"]);
        assert!(m.row(0).unwrap().is_zero());
        assert_eq!(m.row(0).unwrap().cosine(m.row(1).unwrap()), 0.0);
    }

    #[test]
    fn test_term_frequency_raises_weight() {
        let m = TfidfVectorizer::new().fit_transform(&["lease lease term", "lease term term"]);
        let lease = m.column_of("lease").unwrap();
        let term = m.column_of("term").unwrap();
        let r0 = m.row(0).unwrap();
        assert!(r0.get(lease) > r0.get(term));
    }

    #[test]
    fn test_sparse_dot_and_dense_agree() {
        let m = TfidfVectorizer::new().fit_transform(&["a bb cc dd", "bb dd ee", "ff"]);
        let dense = m.to_dense_rows();
        let sparse = m.row(0).unwrap().dot(m.row(1).unwrap());
        let dense_dot: f32 = dense[0].iter().zip(&dense[1]).map(|(a, b)| a * b).sum();
        assert!((sparse - dense_dot).abs() < 1e-6);
        assert_eq!(dense[0].len(), m.dims());
    }

    #[test]
    fn test_squared_distance_matches_dense() {
        let m = TfidfVectorizer::new().fit_transform(&["a bb cc dd", "bb dd ee", "ff", ""]);
        let dense = m.to_dense_rows();
        for i in 0..m.len() {
            for j in 0..m.len() {
                let expected: f32 = dense[i]
                    .iter()
                    .zip(&dense[j])
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                let actual = m.rows()[i].squared_distance(&m.rows()[j]);
                assert!((actual - expected).abs() < 1e-6, "rows {} and {}", i, j);
            }
        }
        assert_eq!(m.rows()[0].squared_distance(&m.rows()[0]), 0.0);
    }
}
