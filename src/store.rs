//! Index store: builds the fragment index and persists it as a pair of
//! artifacts.
//!
//! | Artifact | Format | Contents |
//! |----------|--------|----------|
//! | `index_path` | binary (see [`legal_context_core::index`]) | flat L2 index over build-time TF-IDF rows |
//! | `fragments_path` | JSON | build metadata, SHA-256 of the index artifact, ordered fragment texts |
//!
//! The two files are written and read as a unit. Each is published with a
//! write-to-temp-then-rename so readers never observe a half-written file,
//! and the index is published before the fragment list. On load the
//! fragment list's `index_sha256` must match the index bytes and the
//! fragment count must match the index's vector count; otherwise the pair is
//! torn and reported as [`NotFound`], which callers answer with a rebuild.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use legal_context_core::index::{FlatL2Index, NearestNeighborIndex};
use legal_context_core::vectorize::TfidfVectorizer;

use crate::config::IndexConfig;
use crate::error::{RetrievalError, RetrievalResult};

/// Current fragment artifact version.
const FRAGMENTS_FORMAT_VERSION: u32 = 1;

/// Metadata recorded alongside the fragment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub built_at: DateTime<Utc>,
    pub fragment_size: usize,
    pub document_count: usize,
}

impl BuildInfo {
    pub fn now(fragment_size: usize, document_count: usize) -> Self {
        Self {
            built_at: Utc::now(),
            fragment_size,
            document_count,
        }
    }
}

/// An index together with the fragments its rows stand for.
#[derive(Debug, Clone)]
pub struct IndexedFragments {
    pub index: FlatL2Index,
    pub fragments: Vec<String>,
    pub info: BuildInfo,
}

impl IndexedFragments {
    pub fn dims(&self) -> usize {
        self.index.dims()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Vectorize `fragments` and build a flat L2 index over the rows.
///
/// The index's dimensionality is the vocabulary size of this one fit and
/// stays fixed for the index's lifetime.
pub fn build_index(fragments: Vec<String>, info: BuildInfo) -> RetrievalResult<IndexedFragments> {
    let matrix = TfidfVectorizer::new().fit_transform(&fragments);
    let index = FlatL2Index::from_rows(matrix.dims(), matrix.rows())?;

    tracing::info!(fragments = matrix.len(), dims = index.dims(), "index built");

    Ok(IndexedFragments {
        index,
        fragments,
        info,
    })
}

/// Why a persisted pair could not be used.
#[derive(Error, Debug)]
pub enum NotFound {
    #[error("artifact missing: {}", .0.display())]
    Missing(PathBuf),

    #[error("artifact unreadable '{}': {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("artifacts do not belong together: {0}")]
    TornPair(String),
}

/// On-disk shape of the fragment artifact.
#[derive(Debug, Serialize, Deserialize)]
struct FragmentArtifact {
    version: u32,
    #[serde(flatten)]
    info: BuildInfo,
    index_sha256: String,
    fragments: Vec<String>,
}

/// Reads and writes the index/fragment artifact pair.
#[derive(Debug, Clone)]
pub struct IndexStore {
    index_path: PathBuf,
    fragments_path: PathBuf,
}

impl IndexStore {
    pub fn new(index_path: impl Into<PathBuf>, fragments_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            fragments_path: fragments_path.into(),
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(&config.index_path, &config.fragments_path)
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn fragments_path(&self) -> &Path {
        &self.fragments_path
    }

    /// Write both artifacts, index first.
    pub fn persist(&self, data: &IndexedFragments) -> RetrievalResult<()> {
        let index_bytes = data.index.to_bytes()?;

        let artifact = FragmentArtifact {
            version: FRAGMENTS_FORMAT_VERSION,
            info: data.info.clone(),
            index_sha256: sha256_hex(&index_bytes),
            fragments: data.fragments.clone(),
        };
        let fragment_bytes = serde_json::to_vec(&artifact)
            .map_err(|e| RetrievalError::persistence(&self.fragments_path, e))?;

        write_atomic(&self.index_path, &index_bytes)?;
        write_atomic(&self.fragments_path, &fragment_bytes)?;

        tracing::info!(
            index = %self.index_path.display(),
            fragments = %self.fragments_path.display(),
            count = data.fragments.len(),
            "artifacts persisted"
        );
        Ok(())
    }

    /// Read both artifacts and check they belong together.
    pub fn load(&self) -> Result<IndexedFragments, NotFound> {
        let index_bytes = read_artifact(&self.index_path)?;
        let fragment_bytes = read_artifact(&self.fragments_path)?;

        let artifact: FragmentArtifact =
            serde_json::from_slice(&fragment_bytes).map_err(|e| NotFound::Unreadable {
                path: self.fragments_path.clone(),
                reason: e.to_string(),
            })?;
        if artifact.version != FRAGMENTS_FORMAT_VERSION {
            return Err(NotFound::Unreadable {
                path: self.fragments_path.clone(),
                reason: format!("unsupported version {}", artifact.version),
            });
        }

        let digest = sha256_hex(&index_bytes);
        if digest != artifact.index_sha256 {
            return Err(NotFound::TornPair(format!(
                "index digest {} does not match recorded {}",
                digest, artifact.index_sha256
            )));
        }

        let index = FlatL2Index::from_bytes(&index_bytes).map_err(|e| NotFound::Unreadable {
            path: self.index_path.clone(),
            reason: e.to_string(),
        })?;
        if index.len() != artifact.fragments.len() {
            return Err(NotFound::TornPair(format!(
                "index holds {} vectors but {} fragments were stored",
                index.len(),
                artifact.fragments.len()
            )));
        }

        tracing::info!(
            fragments = artifact.fragments.len(),
            dims = index.dims(),
            "artifacts loaded"
        );

        Ok(IndexedFragments {
            index,
            fragments: artifact.fragments,
            info: artifact.info,
        })
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, NotFound> {
    fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            NotFound::Missing(path.to_path_buf())
        } else {
            NotFound::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })
}

/// Publish `bytes` at `path` via a temp file in the same directory.
fn write_atomic(path: &Path, bytes: &[u8]) -> RetrievalResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| RetrievalError::persistence(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| RetrievalError::persistence(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| RetrievalError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| RetrievalError::persistence(path, e.error))?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
