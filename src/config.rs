// src/config.rs

//! Process-level configuration resolution: TOML file for settings,
//! environment for secrets.

use std::path::Path;

use crate::error::Result;
use crate::models::{Config, Credentials};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Resolve and validate everything a run needs. An explicit path must
/// load; the default path falls back to built-in defaults when absent.
pub fn load(path: Option<&Path>) -> Result<(Config, Credentials)> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG_PATH),
    };
    config.validate()?;

    let credentials = Credentials::from_env();
    credentials.validate(&config)?;
    Ok((config, credentials))
}

/// Like [`load`] but without the credential check, for commands that do
/// not touch the sources (config validation, digest re-send).
pub fn load_config_only(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG_PATH),
    };
    config.validate()?;
    Ok(config)
}
