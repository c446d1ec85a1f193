//! Retrieval service: the explicit, process-lifetime handle to the index.
//!
//! [`RetrievalService::initialize`] is called once at startup. It loads the
//! persisted artifact pair if it is complete and consistent, and otherwise
//! rebuilds from the corpus (load → chunk → vectorize → index → persist).
//! The resulting service is immutable, `Send + Sync`, and is meant to be
//! shared behind an `Arc` by every request path for the life of the process.
//!
//! ```rust,no_run
//! use legal_context::config::Config;
//! use legal_context::service::RetrievalService;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::for_corpus("./laws", Path::new("./data"));
//! let service = RetrievalService::initialize(&config)?;
//! for fragment in service.retrieve("Who may terminate a lease?", 3)? {
//!     println!("{}", fragment);
//! }
//! # Ok(())
//! # }
//! ```

use legal_context_core::chunk::chunk_corpus;
use legal_context_core::index::{FlatL2Index, NearestNeighborIndex, Neighbor};
use legal_context_core::models::RankedFragment;
use legal_context_core::retrieve::rank;

use crate::config::Config;
use crate::corpus::load_corpus;
use crate::error::{RetrievalError, RetrievalResult};
use crate::store::{build_index, BuildInfo, IndexStore, IndexedFragments};

/// Separator between fragments in the context block handed to generation.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// How the service obtained its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    /// Read from the persisted artifact pair.
    Loaded,
    /// Rebuilt from the corpus and persisted.
    Built,
}

impl std::fmt::Display for IndexOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::Built => write!(f, "built"),
        }
    }
}

pub struct RetrievalService {
    data: IndexedFragments,
    store: IndexStore,
    origin: IndexOrigin,
    default_k: usize,
}

impl RetrievalService {
    /// Load the persisted index, rebuilding from the corpus if it is
    /// missing, unreadable, or torn.
    pub fn initialize(config: &Config) -> RetrievalResult<Self> {
        let store = IndexStore::from_config(&config.index);
        match store.load() {
            Ok(data) => Ok(Self::from_parts(data, store, IndexOrigin::Loaded, config)),
            Err(reason) => {
                tracing::warn!(%reason, "persisted index unavailable, rebuilding from corpus");
                Self::rebuild(config)
            }
        }
    }

    /// Rebuild from the corpus and overwrite the persisted pair.
    pub fn rebuild(config: &Config) -> RetrievalResult<Self> {
        let store = IndexStore::from_config(&config.index);
        let data = build_from_corpus(config)?;
        store.persist(&data)?;
        Ok(Self::from_parts(data, store, IndexOrigin::Built, config))
    }

    /// Wrap already-built fragments without touching disk.
    pub fn from_parts(
        data: IndexedFragments,
        store: IndexStore,
        origin: IndexOrigin,
        config: &Config,
    ) -> Self {
        Self {
            data,
            store,
            origin,
            default_k: config.retrieval.top_k,
        }
    }

    /// Top `k` fragment texts for `query`, most relevant first.
    pub fn retrieve(&self, query: &str, k: usize) -> RetrievalResult<Vec<String>> {
        Ok(self
            .retrieve_ranked(query, k)?
            .into_iter()
            .map(|r| r.text)
            .collect())
    }

    /// Top `k` fragments with positions and similarity scores.
    ///
    /// An empty index yields an empty result: there is nothing to answer
    /// from, and retrying will not change that.
    pub fn retrieve_ranked(&self, query: &str, k: usize) -> RetrievalResult<Vec<RankedFragment>> {
        if k == 0 {
            return Err(RetrievalError::InvalidArgument(
                "k must be >= 1".to_string(),
            ));
        }
        let ranked = rank(query, &self.data.fragments, k);
        tracing::debug!(k, results = ranked.len(), "retrieved");
        Ok(ranked)
    }

    /// [`retrieve`](Self::retrieve) with the configured `retrieval.top_k`.
    pub fn retrieve_default(&self, query: &str) -> RetrievalResult<Vec<String>> {
        self.retrieve(query, self.default_k)
    }

    /// The configured top-K fragments joined into one context block for the
    /// answer-generation step. Empty when nothing was retrieved.
    pub fn context_for(&self, query: &str) -> RetrievalResult<String> {
        Ok(self.retrieve_default(query)?.join(CONTEXT_SEPARATOR))
    }

    /// Stored fragments nearest to the fragment at `position`, by squared L2
    /// distance in the build-time vector space. The fragment itself is
    /// excluded.
    pub fn similar(&self, position: usize, k: usize) -> RetrievalResult<Vec<Neighbor>> {
        let vector = self.data.index.vector(position).ok_or_else(|| {
            RetrievalError::InvalidArgument(format!(
                "fragment position {} out of range (0..{})",
                position,
                self.data.fragments.len()
            ))
        })?;
        let mut hits = self.data.index.search(vector, k.saturating_add(1))?;
        hits.retain(|n| n.position != position);
        hits.truncate(k);
        Ok(hits)
    }

    pub fn fragments(&self) -> &[String] {
        &self.data.fragments
    }

    pub fn fragment(&self, position: usize) -> Option<&str> {
        self.data.fragments.get(position).map(String::as_str)
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.data.index
    }

    pub fn info(&self) -> &BuildInfo {
        &self.data.info
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn origin(&self) -> IndexOrigin {
        self.origin
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }
}

/// Load, chunk, and index the configured corpus.
pub fn build_from_corpus(config: &Config) -> RetrievalResult<IndexedFragments> {
    let documents = load_corpus(&config.corpus)?;
    let size = config.chunking.fragment_size;
    let fragments: Vec<String> = chunk_corpus(&documents, size)
        .into_iter()
        .map(|f| f.text)
        .collect();
    if fragments.is_empty() {
        tracing::warn!("corpus is empty; retrieval will return no fragments");
    }
    build_index(fragments, BuildInfo::now(size, documents.len()))
}
