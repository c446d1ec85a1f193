//! Error types for corpus ingestion, artifact persistence, and retrieval.
//!
//! Two failure kinds matter to callers:
//!
//! - **Ingestion** ([`RetrievalError::MissingCorpus`], [`RetrievalError::Ingestion`],
//!   [`RetrievalError::Decode`]): the corpus cannot be read in full. Fatal; no
//!   partial corpus is ever indexed.
//! - **Persistence** ([`RetrievalError::Persistence`]): artifacts cannot be
//!   written. Unreadable artifacts on load are not errors; they are treated
//!   as absent and the index is rebuilt from the corpus.
//!
//! An empty corpus is not an error anywhere.

use std::path::PathBuf;

use legal_context_core::index::IndexError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Corpus directory does not exist: {}", .path.display())]
    MissingCorpus { path: PathBuf },

    #[error("Failed to read corpus file '{}': {source}", .path.display())]
    Ingestion {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corpus file '{}' is not valid UTF-8", .path.display())]
    Decode { path: PathBuf },

    #[error("Failed to persist '{}': {source}", .path.display())]
    Persistence {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RetrievalError {
    /// True for failures that mean the corpus itself could not be ingested.
    pub fn is_ingestion(&self) -> bool {
        matches!(
            self,
            Self::MissingCorpus { .. } | Self::Ingestion { .. } | Self::Decode { .. }
        )
    }

    pub(crate) fn persistence(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Persistence {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type RetrievalResult<T> = std::result::Result<T, RetrievalError>;
