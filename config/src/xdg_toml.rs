//! Load `$XDG_CONFIG_HOME/<app>/config.toml`: the `[env]` table and the `[defaults]` table.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::{LoadError, RunDefaults};

/// `$XDG_CONFIG_HOME` when set, otherwise the platform config dir.
fn config_home() -> Result<PathBuf, LoadError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir().ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into()))
}

fn xdg_config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    if path.exists() {
        Ok(Some(path))
    } else {
        Ok(None)
    }
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    defaults: RunDefaults,
}

fn load_file(app_name: &str) -> Result<ConfigFile, LoadError> {
    let path = match xdg_config_path(app_name)? {
        Some(p) => p,
        None => return Ok(ConfigFile::default()),
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    Ok(toml::from_str(&content)?)
}

/// Returns env key-value pairs from `[env]` section. Missing file or empty section returns empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    Ok(load_file(app_name)?.env)
}

/// Returns the `[defaults]` section. Missing file or section returns all-`None` defaults.
pub fn load_defaults(app_name: &str) -> Result<RunDefaults, LoadError> {
    Ok(load_file(app_name)?.defaults)
}
