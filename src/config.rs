use std::{env, fs, path::Path};

use serde::Deserialize;
use tracing::info;

use crate::error::Result;

pub const CONFIG_PATH_VAR: &str = "SUKIMISE_CONFIG";

/// Service configuration, read from a JSON file.
///
/// Every field has a default, so an absent file or a partial one is fine. The
/// `SUKIMISE_HOST`, `SUKIMISE_PORT` and `SUKIMISE_DB` variables override the file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub pool_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            database_path: "data.db".to_string(),
            pool_size: 8,
        }
    }
}

impl Config {
    pub fn from_config(config: &str) -> Result<Self> {
        Ok(serde_json::from_str(config)?)
    }

    /// Load from `$SUKIMISE_CONFIG` (or `config.json`) and apply env overrides.
    pub fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.json".to_string());
        let mut config = if Path::new(&path).exists() {
            info!("reading config from {}", path);
            Self::from_config(&fs::read_to_string(&path)?)?
        } else {
            info!("no config at {}, using defaults", path);
            Self::default()
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("SUKIMISE_HOST") {
            self.host = host;
        }
        if let Some(port) = var("SUKIMISE_PORT").and_then(|port| port.parse().ok()) {
            self.port = port;
        }
        if let Some(path) = var("SUKIMISE_DB") {
            self.database_path = path;
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
