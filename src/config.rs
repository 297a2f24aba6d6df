use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Connection configuration, loaded from `~/.config/recache/config.toml`.
///
/// Immutable once constructed: changing any field requires building a new
/// client. Every field has a built-in default so a missing or partial config
/// file still yields a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Network address of the cache server.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port of the cache server.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional auth secret; `None` means no authentication.
    #[serde(default)]
    pub auth: Option<String>,
    /// Encrypted transport (rediss://) when true.
    #[serde(default = "default_true")]
    pub tls: bool,
    /// When false the client fails fast: no reconnect attempts at all.
    #[serde(default = "default_true")]
    pub retry: bool,
    /// Prefix prepended to every logical key (may be empty).
    #[serde(default)]
    pub prefix: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6380
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth: None,
            tls: true,
            retry: true,
            prefix: String::new(),
        }
    }
}

impl CacheConfig {
    /// Build the connection URL for the underlying client.
    pub fn connection_url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        let auth = match &self.auth {
            Some(secret) if !secret.is_empty() => format!(":{}@", secret),
            _ => String::new(),
        };
        format!("{}://{}{}:{}", scheme, auth, self.host, self.port)
    }

    /// Full storage key for a logical key.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("recache")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, falling back to defaults on any problem.
///
/// A missing file, unreadable file, or parse error is logged and swallowed;
/// configuration trouble must never take the caller down.
pub fn load_or_default() -> CacheConfig {
    match try_load() {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            tracing::debug!("no cache config file, using defaults");
            CacheConfig::default()
        }
        Err(err) => {
            tracing::warn!("cache config error, using defaults: {err}");
            CacheConfig::default()
        }
    }
}

fn try_load() -> Result<Option<CacheConfig>> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(&path)?;
    let cfg: CacheConfig = toml::from_str(&data)?;
    Ok(Some(cfg))
}
