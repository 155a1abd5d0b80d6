//! Configuration loading and config file resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns tiers 2 and 3; tool crates layer their CLI arguments and
//! defaults on top.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "contactjournalists";

/// Logging section of the TOML config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (e.g. "info", "cj_import=debug")
    #[serde(default)]
    pub level: Option<String>,
}

/// TOML config file contents
///
/// Every field is optional so partial files stay valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the hosted admin backend
    #[serde(default)]
    pub api_url: Option<String>,

    /// Bearer token for the admin backend
    #[serde(default)]
    pub access_token: Option<String>,

    /// Rows per bulk-import call
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Items per image-processing call
    #[serde(default)]
    pub image_batch_size: Option<usize>,

    /// Per-request timeout; unset means wait indefinitely
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default config file path for a tool, e.g. `~/.config/contactjournalists/cj-import.toml`
pub fn default_config_path(tool_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(format!("{}.toml", tool_name)))
}

/// Pick the config file path: explicit argument, then `env_var_name`, then the platform default
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    tool_name: &str,
) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_setting(env_var_name) {
        return Some(PathBuf::from(path));
    }

    default_config_path(tool_name)
}

/// Load a TOML config file
///
/// A missing file is not an error: a warning is logged and defaults are returned.
/// A file that exists but cannot be read or parsed is a `Config` error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// `logging.level` of a config file, read without emitting any log
///
/// Lets a tool install its subscriber before `load_toml_config` runs. Any
/// read or parse failure yields None; the full load reports it.
pub fn peek_log_level(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let config: TomlConfig = toml::from_str(&content).ok()?;
    config.logging.level.filter(|level| is_valid_value(level))
}

/// Write a TOML config file, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    std::fs::write(path, content)?;
    Ok(())
}

/// Read an environment variable, treating empty or whitespace-only values as unset
pub fn env_setting(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| is_valid_value(v))
}

/// Validate a setting value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}
