//! # Legal Context Core
//!
//! Pure retrieval logic for Legal Context: data models, fixed-size chunking,
//! TF-IDF vectorization, the flat nearest-neighbour index, and relevance
//! ranking.
//!
//! This crate performs no filesystem, network, or async work. Loading the
//! corpus and persisting artifacts live in the `legal-context` app crate.

pub mod chunk;
pub mod index;
pub mod models;
pub mod retrieve;
pub mod vectorize;
