//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "relaygate.toml";

/// Load configuration from relaygate.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load relaygate.toml if one exists, otherwise fall back to env-derived defaults
pub fn load_config_or_default() -> Result<Config> {
    match load_config() {
        Ok(config) => Ok(config),
        Err(Error::ConfigNotFound) => {
            tracing::debug!("No {} found, using defaults", CONFIG_FILENAME);
            Ok(Config::default())
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Write configuration to a specific path
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Nearest `relaygate.toml` in the working directory or any of its parents
fn find_config_file() -> Result<PathBuf> {
    let cwd = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;
    cwd.ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
        .ok_or(Error::ConfigNotFound)
}

/// Expand `${BACKEND_URL}` style placeholders. `${NAME:-fallback}` yields the
/// fallback when `NAME` is unset; a bare `${NAME}` yields an empty string.
fn interpolate_env_vars(content: &str) -> String {
    let Ok(placeholder) = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}") else {
        return content.to_string();
    };

    placeholder
        .replace_all(content, |caps: &regex::Captures| {
            env::var(&caps[1]).unwrap_or_else(|_| {
                caps.get(2)
                    .map(|fallback| fallback.as_str().to_string())
                    .unwrap_or_default()
            })
        })
        .into_owned()
}

/// Commented `relaygate.toml` written by `relaygate init`
pub fn default_config_content() -> &'static str {
    r#"# relaygate configuration

environment = "${NODE_ENV:-development}"

[server]
host = "0.0.0.0"
port = 3000
# Pages served behind the auth gate
static_dir = "./public"

[backend]
# Every /api/auth/* and /api/content request is relayed here
url = "${BACKEND_URL:-http://localhost:8000}"
timeout_secs = 30

[client]
# Direct backend calls (chat, pdf, files)
api_url = "${NEXT_PUBLIC_API_URL:-http://localhost:8000}"
# Gateway used by the CLI session commands
gateway_url = "http://localhost:3000"
state_dir = "./.relaygate"

[cookie]
name = "token"
max_age_secs = 86400
# secure = true  # defaults to environment == "production"
"#
}
