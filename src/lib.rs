//! # Legal Context
//!
//! Local retrieval core for answering questions over a legal text corpus.
//!
//! Legal Context reads a directory of statutes, cuts the concatenated text
//! into fixed-size fragments, indexes their TF-IDF vectors, and returns the
//! fragments most relevant to a natural-language question. A separate
//! generation step answers from those fragments alone.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │   Corpus    │──▶│ Chunk+TF-IDF │──▶│  Index + Frags   │
//! │  (*.txt)    │   │  Flat L2     │   │  (two artifacts) │
//! └─────────────┘   └──────────────┘   └────────┬────────┘
//!                                               │
//!                          ┌────────────────────┤
//!                          ▼                    ▼
//!                    ┌──────────┐         ┌──────────┐
//!                    │   CLI    │         │   HTTP   │
//!                    │  (lctx)  │         │ /retrieve│
//!                    └──────────┘         └──────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. The **corpus loader** ([`corpus`]) reads every matching file as UTF-8.
//! 2. Documents are joined with `\n` and split into fixed-size fragments
//!    ([`legal_context_core::chunk`]).
//! 3. Fragments are vectorized with TF-IDF and indexed in a flat L2 index,
//!    then persisted as an index artifact and a fragment artifact ([`store`]).
//! 4. At query time the **retrieval service** ([`service`]) re-vectorizes
//!    the fragments together with the query and ranks by cosine similarity.
//!
//! ## Quick Start
//!
//! ```bash
//! lctx build                              # index ./laws once
//! lctx retrieve "Who may terminate a lease?" -k 3
//! lctx serve                              # HTTP API for the front-end
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Ingestion and persistence error types |
//! | [`corpus`] | Corpus directory loader |
//! | [`store`] | Index build and artifact persistence |
//! | [`service`] | Retrieval service lifecycle and queries |
//! | [`search`] | `retrieve` / `similar` commands |
//! | [`index_cmd`] | `build` command |
//! | [`stats`] | `stats` command |
//! | [`server`] | HTTP retrieval API |

pub mod config;
pub mod corpus;
pub mod error;
pub mod index_cmd;
pub mod search;
pub mod server;
pub mod service;
pub mod stats;
pub mod store;
