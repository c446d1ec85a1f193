//! Corpus loader: reads a directory of text documents into memory.
//!
//! Files are selected by `[corpus].include_globs`, matched against the path
//! relative to the corpus root. Only the top level is scanned unless
//! `recursive = true`. Symlinked files and directories are skipped unless
//! `follow_symlinks = true`. Every selected file must decode as UTF-8; a single
//! unreadable or undecodable file fails the whole load, because silently
//! dropping part of a statute would corrupt answers.
//!
//! Documents are returned sorted by relative path so the concatenation order
//! (and therefore fragment boundaries) is the same on every run.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use legal_context_core::models::Document;

use crate::config::CorpusConfig;
use crate::error::{RetrievalError, RetrievalResult};

/// Read every matching file under the corpus root.
pub fn load_corpus(config: &CorpusConfig) -> RetrievalResult<Vec<Document>> {
    let root = &config.root;
    if !root.is_dir() {
        return Err(RetrievalError::MissingCorpus { path: root.clone() });
    }

    let include_set = build_globset(&config.include_globs)?;

    let max_depth = if config.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .follow_links(config.follow_symlinks)
        .min_depth(1)
        .max_depth(max_depth);

    let mut documents = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            RetrievalError::Ingestion {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if !include_set.is_match(&rel_str) {
            continue;
        }

        documents.push(read_document(path, rel_str)?);
    }

    documents.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    tracing::info!(
        root = %root.display(),
        documents = documents.len(),
        bytes = documents.iter().map(|d| d.content.len()).sum::<usize>(),
        "corpus loaded"
    );

    Ok(documents)
}

fn read_document(path: &Path, source_id: String) -> RetrievalResult<Document> {
    let bytes = std::fs::read(path).map_err(|source| RetrievalError::Ingestion {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|_| RetrievalError::Decode {
        path: path.to_path_buf(),
    })?;

    Ok(Document { source_id, content })
}

fn build_globset(patterns: &[String]) -> RetrievalResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| RetrievalError::InvalidArgument(format!("glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| RetrievalError::InvalidArgument(e.to_string()))
}
