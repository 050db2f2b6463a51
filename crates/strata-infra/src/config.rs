//! Memory configuration loader for Strata.
//!
//! Reads `config.toml` from the data directory (`~/.strata/` by default)
//! and deserializes it into [`MemoryConfig`]. Falls back to defaults when
//! the file is missing, malformed, or fails validation.

use std::path::Path;

use strata_types::config::MemoryConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Load memory configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`MemoryConfig::default()`].
/// - Unreadable or unparsable file: warning, then the default.
/// - Parsed but invalid (e.g. hot retention beyond cold): warning, then the default.
pub async fn load_memory_config(data_dir: &Path) -> MemoryConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No memory config at {}, using defaults", config_path.display());
            return MemoryConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Could not read memory config {}: {err}; falling back to defaults",
                config_path.display()
            );
            return MemoryConfig::default();
        }
    };

    let config = match toml::from_str::<MemoryConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Memory config {} is not valid TOML: {err}; falling back to defaults",
                config_path.display()
            );
            return MemoryConfig::default();
        }
    };

    match config.validate() {
        Ok(()) => config,
        Err(err) => {
            tracing::warn!(
                "Memory config {} rejected: {err}; falling back to defaults",
                config_path.display()
            );
            MemoryConfig::default()
        }
    }
}
