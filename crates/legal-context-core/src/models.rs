//! Core data models shared by the retrieval pipeline.

use serde::Serialize;

/// Raw text of one ingested file.
///
/// Documents are read once, concatenated, and dropped after chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path of the file relative to the corpus root.
    pub source_id: String,
    pub content: String,
}

impl Document {
    pub fn new(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            content: content.into(),
        }
    }
}

/// A contiguous, fixed-size slice of the concatenated corpus.
///
/// `position` is the fragment's ordinal in storage order. Fragments are never
/// re-split or merged once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub position: usize,
    pub text: String,
}

/// A fragment selected by the retriever, with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFragment {
    /// Ordinal of the fragment in the stored fragment list.
    pub position: usize,
    /// Cosine similarity to the query in `[0.0, 1.0]`.
    pub score: f32,
    pub text: String,
}
