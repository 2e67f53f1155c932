use anyhow::Context;
use doorlock_core::config::{Config, CONFIG_FILE};
use std::path::{Path, PathBuf};

/// Where the config lives.
///
/// Priority:
/// 1. `--config` flag / `DOORLOCK_CONFIG` env var (passed in as `explicit`)
/// 2. `doorlock.yaml` in the current directory
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    cwd.join(CONFIG_FILE)
}

/// Load the config. An explicit path must exist; the implicit one falls
/// back to built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = config_path(explicit);
    if explicit.is_none() && !path.exists() {
        tracing::debug!("no {CONFIG_FILE} found, using defaults");
        return Ok(Config::default());
    }
    Config::load(&path).with_context(|| format!("failed to load {}", path.display()))
}
