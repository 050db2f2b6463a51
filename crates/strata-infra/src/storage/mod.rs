//! Durable storage for Strata.
//!
//! Implements the storage ports from `strata-core` on top of JSON files in
//! a data directory, and resolves where that directory lives.

use std::path::PathBuf;

pub mod filesystem;

pub use filesystem::JsonFileStorage;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STRATA_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `STRATA_DATA_DIR` environment variable
/// 2. `~/.strata`
/// 3. `./.strata` when no home directory is known
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".strata");
    }

    PathBuf::from(".strata")
}
