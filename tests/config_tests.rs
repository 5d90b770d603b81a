//! Configuration loading tests
//!
//! Run with: cargo test --test config_tests

use relaygate::config::loader::{default_config_content, load_config_from_path, CONFIG_FILENAME};
use relaygate::config::{save_config, Config};
use relaygate::error::Error;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.cookie.name, "token");
    assert_eq!(config.cookie.max_age_secs, 86400);
    assert_eq!(config.backend.timeout_secs, 30);
}

#[test]
fn test_load_with_env_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);
    fs::write(
        &path,
        r#"
environment = "${RELAYGATE_TEST_UNSET_ENV:-production}"

[backend]
url = "${RELAYGATE_TEST_UNSET_BACKEND:-http://api.internal:8000}"
"#,
    )
    .unwrap();

    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.backend.url, "http://api.internal:8000");
    assert!(config.is_production());
    assert!(config.secure_cookies());
    println!("✓ Env defaults applied: {}", config.backend.url);
}

#[test]
fn test_secure_override() {
    let mut config = Config::default();
    config.environment = "production".to_string();
    config.cookie.secure = Some(false);
    assert!(!config.secure_cookies());

    config.environment = "development".to_string();
    config.cookie.secure = Some(true);
    assert!(config.secure_cookies());
}

#[test]
fn test_generated_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);
    fs::write(&path, default_config_content()).unwrap();

    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.server.static_dir, std::path::PathBuf::from("./public"));
    assert_eq!(config.client.gateway_url, "http://localhost:3000");
    assert!(config.cookie.secure.is_none());
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);

    let mut config = Config::default();
    config.server.port = 8080;
    config.cookie.name = "session".to_string();
    config.cookie.secure = Some(true);
    save_config(&config, &path).unwrap();

    let loaded = load_config_from_path(&path).unwrap();
    assert_eq!(loaded.server.port, 8080);
    assert_eq!(loaded.cookie.name, "session");
    assert_eq!(loaded.cookie.secure, Some(true));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = load_config_from_path(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::ConfigNotFound)));
}

#[test]
fn test_invalid_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);
    fs::write(&path, "[server\nport = ").unwrap();

    let err = load_config_from_path(&path).unwrap_err();
    assert!(matches!(err, Error::TomlParse(_)));
    assert!(err.to_string().contains("TOML"));
}
