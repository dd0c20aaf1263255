//! Platform-appropriate default locations for toolshed data.
//!
//! | Platform | Cache Dir | Config Dir |
//! |----------|-----------|------------|
//! | **macOS** | `~/Library/Caches/toolshed` | `~/Library/Application Support/toolshed` |
//! | **Linux** | `~/.cache/toolshed` (XDG_CACHE_HOME) | `~/.config/toolshed` (XDG_CONFIG_HOME) |
//!
//! Both support environment variable overrides for testing and CI:
//! - `TOOLSHED_CACHE_DIR` - Override cache directory
//! - `TOOLSHED_CONFIG_DIR` - Override config directory

use crate::{Error, Result};
use std::path::PathBuf;

fn env_dir(var: &str) -> Option<PathBuf> {
    match std::env::var(var) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => None,
    }
}

/// Get the cache directory for toolshed.
///
/// Conda environments, downloaded tools and pre-bundled binaries live below
/// this directory unless configured otherwise.
///
/// Resolution order:
/// 1. `TOOLSHED_CACHE_DIR` environment variable
/// 2. Platform cache directory + `/toolshed`
///
/// # Errors
///
/// Returns an error if the cache directory cannot be determined.
pub fn cache_dir() -> Result<PathBuf> {
    if let Some(dir) = env_dir("TOOLSHED_CACHE_DIR") {
        return Ok(dir);
    }

    let base = dirs::cache_dir()
        .ok_or_else(|| Error::configuration("Could not determine cache directory"))?;

    Ok(base.join("toolshed"))
}

/// Get the configuration directory for toolshed.
///
/// Resolution order:
/// 1. `TOOLSHED_CONFIG_DIR` environment variable
/// 2. Platform config directory + `/toolshed`
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = env_dir("TOOLSHED_CONFIG_DIR") {
        return Ok(dir);
    }

    let base = dirs::config_dir()
        .ok_or_else(|| Error::configuration("Could not determine config directory"))?;

    Ok(base.join("toolshed"))
}

/// Default root for managed tool installations.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be determined.
pub fn tools_dir() -> Result<PathBuf> {
    Ok(cache_dir()?.join("tools"))
}

/// Default path of the user configuration file.
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
