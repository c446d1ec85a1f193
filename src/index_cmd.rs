//! `lctx build`: make sure a usable index exists on disk.
//!
//! Without `--force` this is the same load-or-rebuild path the service takes
//! at startup. With `--force` the index is rebuilt from the corpus even if a
//! valid pair is persisted. The old pair stays on disk until the rebuild has
//! succeeded and the new pair replaces it.

use anyhow::Result;
use legal_context_core::index::NearestNeighborIndex;

use crate::config::Config;
use crate::service::RetrievalService;

pub fn run_build(config: &Config, force: bool) -> Result<()> {
    let service = if force {
        RetrievalService::rebuild(config)?
    } else {
        RetrievalService::initialize(config)?
    };

    let info = service.info();
    println!("build ({})", service.origin());
    println!("  corpus: {}", config.corpus.root.display());
    println!("  documents: {}", info.document_count);
    println!("  fragments: {}", service.fragments().len());
    println!("  fragment size: {}", info.fragment_size);
    println!("  dimensions: {}", service.index().dims());
    println!("  index artifact: {}", service.store().index_path().display());
    println!("  fragments artifact: {}", service.store().fragments_path().display());
    println!("ok");

    Ok(())
}
