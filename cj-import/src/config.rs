//! Configuration resolution for cj-import
//!
//! Every setting resolves with CLI → ENV → TOML → default priority. The
//! source each setting came from is logged; secrets are never logged.

use cj_common::config::{env_setting, is_valid_value, load_toml_config, peek_log_level, TomlConfig};
use cj_common::{Error, Result};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::services::{DEFAULT_BATCH_SIZE, IMAGE_BATCH_SIZE};

pub const ENV_API_URL: &str = "CJ_API_URL";
pub const ENV_ACCESS_TOKEN: &str = "CJ_ACCESS_TOKEN";
pub const ENV_BATCH_SIZE: &str = "CJ_BATCH_SIZE";
pub const ENV_IMAGE_BATCH_SIZE: &str = "CJ_IMAGE_BATCH_SIZE";
pub const ENV_REQUEST_TIMEOUT: &str = "CJ_REQUEST_TIMEOUT_SECS";
pub const ENV_CONFIG: &str = "CJ_CONFIG";

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub access_token: Option<String>,
    pub batch_size: Option<usize>,
    pub image_batch_size: Option<usize>,
    pub request_timeout_secs: Option<u64>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub api_url: Option<String>,
    pub access_token: Option<String>,
    pub batch_size: usize,
    pub image_batch_size: usize,
    /// None waits for the backend indefinitely
    pub request_timeout: Option<Duration>,
    pub log_level: Option<String>,
}

/// Load the TOML config file once logging is up
///
/// `init_logging` receives the file's `logging.level` and installs the
/// subscriber; the load runs afterwards so its own warnings (missing file)
/// are not lost. Without a path the defaults are returned.
pub fn load_config_with_logging<G>(
    path: Option<&Path>,
    init_logging: impl FnOnce(Option<&str>) -> G,
) -> (G, Result<TomlConfig>) {
    let level = path.and_then(peek_log_level);
    let logging = init_logging(level.as_deref());

    let config = match path {
        Some(path) => load_toml_config(path),
        None => Ok(TomlConfig::default()),
    };
    (logging, config)
}

impl ImportConfig {
    /// Resolve every setting from the three tiers
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let api_url = resolve_string(
            "API URL",
            cli.api_url.clone(),
            ENV_API_URL,
            toml_config.api_url.clone(),
            true,
        );
        let access_token = resolve_string(
            "Access token",
            cli.access_token.clone(),
            ENV_ACCESS_TOKEN,
            toml_config.access_token.clone(),
            false,
        );

        let batch_size = resolve_number(
            "batch_size",
            cli.batch_size,
            ENV_BATCH_SIZE,
            toml_config.batch_size,
        )?
        .unwrap_or(DEFAULT_BATCH_SIZE);
        let image_batch_size = resolve_number(
            "image_batch_size",
            cli.image_batch_size,
            ENV_IMAGE_BATCH_SIZE,
            toml_config.image_batch_size,
        )?
        .unwrap_or(IMAGE_BATCH_SIZE);

        if batch_size == 0 {
            return Err(Error::InvalidInput("batch_size must be at least 1".to_string()));
        }
        if image_batch_size == 0 {
            return Err(Error::InvalidInput(
                "image_batch_size must be at least 1".to_string(),
            ));
        }

        let request_timeout = resolve_number(
            "request_timeout_secs",
            cli.request_timeout_secs,
            ENV_REQUEST_TIMEOUT,
            toml_config.request_timeout_secs,
        )?
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

        Ok(Self {
            api_url,
            access_token,
            batch_size,
            image_batch_size,
            request_timeout,
            log_level: toml_config.logging.level.clone(),
        })
    }

    /// API URL and token needed to reach the hosted backend
    pub fn remote_credentials(&self) -> Result<(&str, &str)> {
        let api_url = self.api_url.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "Admin API URL not configured. Please configure using one of:\n\
                 1. Command line: --api-url https://<project>.supabase.co\n\
                 2. Environment: {}=https://<project>.supabase.co\n\
                 3. TOML config: ~/.config/contactjournalists/cj-import.toml (api_url = \"...\")\n\
                 \n\
                 Or use --dry-run to import into memory.",
                ENV_API_URL
            ))
        })?;
        let access_token = self.access_token.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "Access token not configured. Set --access-token, {} or access_token in the TOML config",
                ENV_ACCESS_TOKEN
            ))
        })?;
        Ok((api_url, access_token))
    }
}

fn resolve_string(
    label: &str,
    cli: Option<String>,
    env_var: &str,
    toml: Option<String>,
    log_value: bool,
) -> Option<String> {
    let candidates = [
        ("command line", cli.filter(|v| is_valid_value(v))),
        ("environment variable", env_setting(env_var)),
        ("TOML config", toml.filter(|v| is_valid_value(v))),
    ];

    let present: Vec<&str> = candidates
        .iter()
        .filter(|(_, v)| v.is_some())
        .map(|(source, _)| *source)
        .collect();
    if present.len() > 1 {
        warn!(
            "{} found in multiple sources: {}. Using {}.",
            label,
            present.join(", "),
            present[0]
        );
    }

    let (source, value) = candidates.into_iter().find(|(_, v)| v.is_some())?;
    let value = value.map(|v| v.trim().to_string())?;
    if log_value {
        info!("{} loaded from {}: {}", label, source, value);
    } else {
        info!("{} loaded from {}", label, source);
    }
    Some(value)
}

fn resolve_number<T>(
    name: &str,
    cli: Option<T>,
    env_var: &str,
    toml: Option<T>,
) -> Result<Option<T>>
where
    T: FromStr + Copy + Display,
    T::Err: Display,
{
    if let Some(value) = cli {
        info!("{} = {} (command line)", name, value);
        return Ok(Some(value));
    }

    if let Some(raw) = env_setting(env_var) {
        let value = raw
            .parse::<T>()
            .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", env_var, raw, e)))?;
        info!("{} = {} (environment variable)", name, value);
        return Ok(Some(value));
    }

    if let Some(value) = toml {
        info!("{} = {} (TOML config)", name, value);
        return Ok(Some(value));
    }

    Ok(None)
}
