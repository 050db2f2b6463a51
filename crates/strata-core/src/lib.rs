//! Engine logic and port traits for Strata.
//!
//! This crate defines the "ports" (storage and embedder traits) that the
//! infrastructure layer implements. It depends only on `strata-types` --
//! never on `strata-infra` or any filesystem/model crate.

pub mod memory;
