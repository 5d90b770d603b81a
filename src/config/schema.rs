//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Deployment environment; `production` turns on secure cookies
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub cookie: CookieConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            client: ClientConfig::default(),
            cookie: CookieConfig::default(),
        }
    }
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Whether cookies minted by the gateway carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.cookie.secure.unwrap_or_else(|| self.is_production())
    }
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn default_environment() -> String {
    env_or("NODE_ENV", "development")
}

/// Gateway listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served behind the auth gate
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./public")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Relay target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    env_or("BACKEND_URL", "http://localhost:8000")
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Settings used by the session client and the direct backend client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for direct backend calls (chat, pdf, files)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL of the gateway whose relay endpoints the session client calls
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Where the CLI keeps its token and cookie files
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_api_url() -> String {
    env_or("NEXT_PUBLIC_API_URL", "http://localhost:8000")
}

fn default_gateway_url() -> String {
    env_or("RELAYGATE_URL", "http://localhost:3000")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("./.relaygate")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            gateway_url: default_gateway_url(),
            state_dir: default_state_dir(),
        }
    }
}

/// Session cookie attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,

    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: i64,

    /// Overrides the environment-derived `Secure` flag
    #[serde(default)]
    pub secure: Option<bool>,
}

fn default_cookie_name() -> String {
    crate::auth::TOKEN_COOKIE.to_string()
}

fn default_max_age_secs() -> i64 {
    86400
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            max_age_secs: default_max_age_secs(),
            secure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_cookies_follow_environment() {
        let mut config = Config::default();
        config.environment = "production".to_string();
        assert!(config.secure_cookies());

        config.environment = "development".to_string();
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_secure_override_wins() {
        let mut config = Config::default();
        config.environment = "production".to_string();
        config.cookie.secure = Some(false);
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[server]\nport = 4000\n").unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cookie.name, "token");
        assert_eq!(config.cookie.max_age_secs, 86400);
    }
}
