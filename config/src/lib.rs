//! Load configuration from XDG `config.toml` and project `.env`.
//!
//! - [`load_and_apply`] sets process environment variables with priority
//!   **existing env > .env > XDG `[env]`** (e.g. `OPENAI_API_KEY`, `RUST_LOG`).
//! - [`load_defaults`] reads the XDG `[defaults]` table the CLI falls back to when a flag
//!   is not given.
//! - [`logging::init`] (feature `tracing-init`) installs the tracing subscriber.

mod dotenv;
#[cfg(feature = "tracing-init")]
pub mod logging;
mod xdg_toml;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// `[defaults]` table of `config.toml`. Every key is optional.
///
/// ```toml
/// [defaults]
/// backend = "gpt-4o"
/// temperature = 0.7
/// threshold = 0.5
/// log_dir = "~/ponder-logs"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RunDefaults {
    pub backend: Option<String>,
    pub temperature: Option<f32>,
    pub threshold: Option<f64>,
    pub log_dir: Option<PathBuf>,
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets environment
/// variables only for keys that are **not** already set (so existing env has highest priority).
///
/// Order of precedence when a key is missing in the process environment:
/// 1. Value from project `.env` (current directory or `override_dir` if given)
/// 2. Value from `$XDG_CONFIG_HOME/<app_name>/config.toml` `[env]` table
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;

    let mut keys: std::collections::HashSet<&String> = xdg_map.keys().collect();
    keys.extend(dotenv_map.keys());

    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(v) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, v);
        }
    }

    Ok(())
}

/// Reads `[defaults]` from `$XDG_CONFIG_HOME/<app_name>/config.toml`.
pub fn load_defaults(app_name: &str) -> Result<RunDefaults, LoadError> {
    xdg_toml::load_defaults(app_name)
}
