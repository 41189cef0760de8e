//! Application settings loaded from `config.toml` and the environment.
//!
//! Every field has a default, so a missing file yields a working local setup.
//! `DATABASE_URL`, `BIND_ADDR` and `WEBSMS_API_KEY` override the file.

use crate::core::parser::Parser;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// Ingestion settings
    pub websms: WebSmsConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SeaORM` connection URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/cashflow.sqlite?mode=rwc".to_string(),
        }
    }
}

/// `[websms]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSmsConfig {
    /// Parsing strategy for this deployment
    pub parser: Parser,
    /// How long a resolved API key stays cached
    pub key_cache_ttl_secs: u64,
    /// Optional key bound to `default_group` on first use
    pub default_api_key: Option<String>,
    /// Group name the default key is bound to
    pub default_group: String,
}

impl Default for WebSmsConfig {
    fn default() -> Self {
        Self {
            parser: Parser::default(),
            key_cache_ttl_secs: 300,
            default_api_key: None,
            default_group: "family".to_string(),
        }
    }
}

impl WebSmsConfig {
    /// Cache TTL as a `Duration`
    #[must_use]
    pub const fn key_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.key_cache_ttl_secs)
    }
}

/// Parses configuration from a TOML string.
///
/// `websms.key_cache_ttl_secs` must be at least 1.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    if config.websms.key_cache_ttl_secs == 0 {
        return Err(Error::Config {
            message: "websms.key_cache_ttl_secs must be at least 1".to_string(),
        });
    }
    Ok(config)
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads `./config.toml` when present, otherwise defaults, then applies
/// environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    let mut config = if path.exists() {
        debug!("Loading configuration from {:?}", path);
        load_config(path)?
    } else {
        info!("config.toml not found, using defaults");
        AppConfig::default()
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(addr) = var("BIND_ADDR") {
        config.server.bind_addr = addr;
    }
    if let Some(key) = var("WEBSMS_API_KEY").filter(|k| !k.trim().is_empty()) {
        config.websms.default_api_key = Some(key);
    }
}
