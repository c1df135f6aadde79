//! Optional `config.toml` with per-user defaults.
//!
//! ```toml
//! db_path = "/home/me/challenges/db.json"
//! color = false
//! default_format = "json"
//! ```

use crate::error::CliError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// DB file used when neither `--db` nor `CHALLENGE_DB_PATH` is set.
    pub db_path: Option<String>,
    /// `false` disables ANSI colors like `--no-color` does.
    pub color: Option<bool>,
    /// `table`, `json` or `csv`.
    pub default_format: Option<String>,
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `--config`, then `CHALLENGE_CONFIG`, then the XDG config directory.
/// An explicitly named file must exist; the default location may not.
pub fn resolve_config_path(cli_path: Option<&str>) -> Option<(PathBuf, bool)> {
    if let Some(p) = cli_path.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        return Some((PathBuf::from(p), true));
    }
    if let Some(p) = non_empty_env("CHALLENGE_CONFIG") {
        return Some((PathBuf::from(p), true));
    }

    let base = non_empty_env("XDG_CONFIG_HOME").map(PathBuf::from).or_else(|| {
        non_empty_env("HOME")
            .or_else(|| non_empty_env("USERPROFILE"))
            .map(|h| Path::new(&h).join(".config"))
    })?;
    Some((base.join("challenge-tracker").join("config.toml"), false))
}

pub fn load_config(cli_path: Option<&str>) -> Result<Config, CliError> {
    let Some((path, required)) = resolve_config_path(cli_path) else {
        return Ok(Config::default());
    };

    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            debug!(path = %path.display(), "no config file");
            return Ok(Config::default());
        }
        Err(_) => {
            return Err(CliError::io(format!(
                "Config IO error: {}",
                path.display()
            )))
        }
    };

    let config: Config = toml::from_str(&text).map_err(|e| {
        CliError::usage(format!("Invalid config {}: {}", path.display(), e.message()))
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}
