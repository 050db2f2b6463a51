//! Shared domain types for Strata.
//!
//! This crate contains the types shared across the Strata workspace:
//! vector records, retention tiers, graph edges, lineage traces,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod error;
pub mod graph;
pub mod memory;
