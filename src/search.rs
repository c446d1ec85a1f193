//! `lctx retrieve` and `lctx similar`.

use anyhow::{bail, Result};
use serde::Serialize;

use legal_context_core::models::RankedFragment;

use crate::config::Config;
use crate::service::{RetrievalService, CONTEXT_SEPARATOR};

/// Output format for `lctx retrieve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveOutput {
    Text,
    Json,
    Context,
}

#[derive(Serialize)]
struct RetrieveJson<'a> {
    query: &'a str,
    k: usize,
    fragments: &'a [RankedFragment],
}

pub fn run_retrieve(
    config: &Config,
    query: &str,
    k: Option<usize>,
    output: RetrieveOutput,
) -> Result<()> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let service = RetrievalService::initialize(config)?;
    let k = k.unwrap_or(service.default_k());
    let ranked = service.retrieve_ranked(query, k)?;

    match output {
        RetrieveOutput::Json => {
            let body = RetrieveJson {
                query,
                k,
                fragments: &ranked,
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        RetrieveOutput::Context => {
            let texts: Vec<&str> = ranked.iter().map(|r| r.text.as_str()).collect();
            println!("{}", texts.join(CONTEXT_SEPARATOR));
        }
        RetrieveOutput::Text => {
            if ranked.is_empty() {
                println!("No results.");
                return Ok(());
            }
            for (rank, r) in ranked.iter().enumerate() {
                println!(
                    "{}. [score: {:.4}] fragment #{}",
                    rank + 1,
                    r.score,
                    r.position
                );
                println!("   {}", indent(&r.text));
                println!();
            }
        }
    }

    Ok(())
}

pub fn run_similar(config: &Config, position: usize, k: Option<usize>) -> Result<()> {
    let service = RetrievalService::initialize(config)?;
    let k = k.unwrap_or(service.default_k());
    if k == 0 {
        bail!("k must be >= 1");
    }
    let hits = service.similar(position, k)?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{}. [distance: {:.4}] fragment #{}",
            rank + 1,
            hit.distance,
            hit.position
        );
        if let Some(text) = service.fragment(hit.position) {
            println!("   {}", indent(text));
        }
        println!();
    }

    Ok(())
}

fn indent(text: &str) -> String {
    text.trim_end().replace('\n', "\n   ")
}
