//! Infrastructure layer for Strata.
//!
//! Contains implementations of the port traits defined in `strata-core`:
//! JSON-file partition and graph storage, the fastembed local embedder,
//! and the `config.toml` loader.

pub mod config;
pub mod storage;
pub mod vector;
