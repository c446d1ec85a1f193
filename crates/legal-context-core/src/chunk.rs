//! Fixed-size positional chunker.
//!
//! The corpus is concatenated into a single buffer (documents joined by
//! `\n`, in loader order) and cut into successive slices of `size`
//! characters starting at offsets `0, size, 2*size, …`. Boundaries are purely
//! positional: no sentence or paragraph awareness, no overlap. The last
//! fragment may be shorter than `size`.
//!
//! Sizes are counted in Unicode scalar values, not bytes, so multi-byte text
//! is never split inside a character.
//!
//! # Example
//!
//! ```rust
//! use legal_context_core::chunk::chunk_text;
//!
//! let fragments = chunk_text("abcdefg", 3);
//! let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
//! assert_eq!(texts, vec!["abc", "def", "g"]);
//! ```

use crate::models::{Document, Fragment};

/// Default fragment size in characters.
pub const DEFAULT_FRAGMENT_SIZE: usize = 500;

/// Separator placed between documents in the concatenated buffer.
pub const DOCUMENT_SEPARATOR: &str = "\n";

/// Join document contents in order, separated by [`DOCUMENT_SEPARATOR`].
pub fn concat_documents(documents: &[Document]) -> String {
    let mut buffer = String::with_capacity(
        documents.iter().map(|d| d.content.len() + 1).sum::<usize>(),
    );
    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            buffer.push_str(DOCUMENT_SEPARATOR);
        }
        buffer.push_str(&doc.content);
    }
    buffer
}

/// Split `text` into fragments of at most `size` characters.
///
/// # Guarantees
///
/// - An empty buffer yields no fragments.
/// - Every fragment except the last has exactly `size` characters.
/// - Concatenating all fragment texts reproduces `text` exactly.
/// - Positions are contiguous: `0, 1, 2, …, N-1`.
///
/// # Panics
///
/// Panics if `size` is zero. Configuration loading rejects a zero size
/// before it reaches the chunker.
pub fn chunk_text(text: &str, size: usize) -> Vec<Fragment> {
    assert!(size > 0, "fragment size must be > 0");

    let mut fragments = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == size {
            fragments.push(make_fragment(fragments.len(), &text[start..offset]));
            start = offset;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        fragments.push(make_fragment(fragments.len(), &text[start..]));
    }

    fragments
}

/// Concatenate `documents` and chunk the resulting buffer.
pub fn chunk_corpus(documents: &[Document], size: usize) -> Vec<Fragment> {
    chunk_text(&concat_documents(documents), size)
}

fn make_fragment(position: usize, text: &str) -> Fragment {
    Fragment {
        position,
        text: text.to_string(),
    }
}
