//! # Legal Context CLI (`lctx`)
//!
//! Builds the fragment index for a legal corpus and answers retrieval
//! queries against it.
//!
//! ## Usage
//!
//! ```bash
//! lctx --config ./config/lctx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lctx build` | Load the persisted index, or build it from the corpus |
//! | `lctx build --force` | Discard the persisted index and rebuild |
//! | `lctx retrieve "<query>"` | Print the top-K fragments for a question |
//! | `lctx similar <position>` | Print stored fragments nearest to a fragment |
//! | `lctx stats` | Show what the persisted artifacts contain |
//! | `lctx serve` | Start the HTTP retrieval API |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use legal_context::search::RetrieveOutput;
use legal_context::{config, index_cmd, search, server, stats};

/// Legal Context: retrieval over a local legal text corpus.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "lctx",
    about = "Legal Context: retrieval over a local legal text corpus",
    version,
    long_about = "Legal Context splits a directory of legal texts into fixed-size fragments, \
    indexes their TF-IDF vectors on disk, and returns the fragments most relevant to a question \
    so a generation step can answer from them."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lctx.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make sure the index exists on disk.
    ///
    /// Loads the persisted index and fragment list if both are present and
    /// consistent; otherwise reads the corpus, chunks it, builds the index,
    /// and persists both artifacts.
    Build {
        /// Rebuild from the corpus even if a valid index is persisted.
        #[arg(long)]
        force: bool,
    },

    /// Retrieve the fragments most relevant to a question.
    Retrieve {
        /// The question to retrieve context for.
        query: String,

        /// Number of fragments to return (defaults to `[retrieval].top_k`).
        #[arg(short, long)]
        k: Option<usize>,

        /// Print results as JSON.
        #[arg(long, conflicts_with = "context")]
        json: bool,

        /// Print only the joined context block handed to generation.
        #[arg(long)]
        context: bool,
    },

    /// List stored fragments nearest to a given fragment.
    Similar {
        /// Fragment position (0-based).
        position: usize,

        /// Number of neighbours to return (defaults to `[retrieval].top_k`).
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Show persisted index statistics.
    Stats,

    /// Start the HTTP retrieval API on `[server].bind`.
    Serve,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "legal_context=debug,legal_context_core=debug,tower_http=debug"
    } else {
        "legal_context=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build { force } => {
            index_cmd::run_build(&cfg, force)?;
        }
        Commands::Retrieve {
            query,
            k,
            json,
            context,
        } => {
            let output = if json {
                RetrieveOutput::Json
            } else if context {
                RetrieveOutput::Context
            } else {
                RetrieveOutput::Text
            };
            search::run_retrieve(&cfg, &query, k, output)?;
        }
        Commands::Similar { position, k } => {
            search::run_similar(&cfg, position, k)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
