//! Query-time relevance ranking.
//!
//! Retrieval does not score through the persisted index. The index was built
//! over the fragments' own vocabulary, and a query vector fitted separately
//! would live in a different space. Instead the fragments and the query are
//! vectorized together in one [`TfidfVectorizer::fit_transform`] call, so
//! they share one vocabulary and dimensionality, and fragments are scored by
//! cosine similarity against the final (query) row.
//!
//! Re-fitting per query is intentional: out-of-vocabulary query terms take
//! part in the IDF computation, which a cached vocabulary would ignore.
//!
//! # Ordering
//!
//! Results are sorted by similarity descending, then by fragment position
//! ascending, so ties are reproducible.

use crate::models::RankedFragment;
use crate::vectorize::TfidfVectorizer;

/// Rank `fragments` against `query` and return the top `k`, best first.
///
/// - `k` larger than the fragment count returns every fragment, ranked.
/// - No fragments (or `k == 0`) returns an empty result.
pub fn rank<S: AsRef<str>>(query: &str, fragments: &[S], k: usize) -> Vec<RankedFragment> {
    if fragments.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut collection: Vec<&str> = fragments.iter().map(|f| f.as_ref()).collect();
    collection.push(query);

    let matrix = TfidfVectorizer::new().fit_transform(&collection);
    let (query_row, fragment_rows) = match matrix.rows().split_last() {
        Some(split) => split,
        None => return Vec::new(),
    };

    let mut scored: Vec<(usize, f32)> = fragment_rows
        .iter()
        .enumerate()
        .map(|(position, row)| (position, row.cosine(query_row)))
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(k);

    scored
        .into_iter()
        .map(|(position, score)| RankedFragment {
            position,
            score,
            text: fragments[position].as_ref().to_string(),
        })
        .collect()
}

/// Like [`rank`], returning only the fragment texts.
pub fn retrieve<S: AsRef<str>>(query: &str, fragments: &[S], k: usize) -> Vec<String> {
    rank(query, fragments, k)
        .into_iter()
        .map(|r| r.text)
        .collect()
}
