//! TOML configuration for Legal Context.
//!
//! ```toml
//! [corpus]
//! root = "./laws"
//! include_globs = ["*.txt"]
//! recursive = false
//! follow_symlinks = false
//!
//! [chunking]
//! fragment_size = 500
//!
//! [index]
//! index_path = "./data/law_index.bin"
//! fragments_path = "./data/law_fragments.json"
//!
//! [retrieval]
//! top_k = 3
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```
//!
//! Everything except `[corpus].root` has a default. Configuration is read
//! once at startup; nothing here is adjustable per query.

use anyhow::{Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use legal_context_core::chunk::DEFAULT_FRAGMENT_SIZE;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["*.txt".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_fragment_size")]
    pub fragment_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            fragment_size: default_fragment_size(),
        }
    }
}

fn default_fragment_size() -> usize {
    DEFAULT_FRAGMENT_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
    #[serde(default = "default_fragments_path")]
    pub fragments_path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            fragments_path: default_fragments_path(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/law_index.bin")
}
fn default_fragments_path() -> PathBuf {
    PathBuf::from("./data/law_fragments.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Configuration with defaults for everything but the corpus root and
    /// the directory holding both artifacts.
    pub fn for_corpus(root: impl Into<PathBuf>, data_dir: &Path) -> Self {
        Self {
            corpus: CorpusConfig {
                root: root.into(),
                include_globs: default_include_globs(),
                recursive: false,
                follow_symlinks: false,
            },
            chunking: ChunkingConfig::default(),
            index: IndexConfig {
                index_path: data_dir.join("law_index.bin"),
                fragments_path: data_dir.join("law_fragments.json"),
            },
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Check the invariants `load_config` enforces on parsed files.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.fragment_size == 0 {
            anyhow::bail!("chunking.fragment_size must be > 0");
        }

        if self.retrieval.top_k < 1 {
            anyhow::bail!("retrieval.top_k must be >= 1");
        }

        if self.corpus.include_globs.is_empty() {
            anyhow::bail!("corpus.include_globs must not be empty");
        }
        for pattern in &self.corpus.include_globs {
            Glob::new(pattern)
                .with_context(|| format!("Invalid corpus.include_globs pattern: '{}'", pattern))?;
        }

        if self.index.index_path == self.index.fragments_path {
            anyhow::bail!("index.index_path and index.fragments_path must be different files");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
