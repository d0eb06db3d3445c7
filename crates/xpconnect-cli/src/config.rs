//! Configuration file loading

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use xpconnect_client::ConnectorConfig;

/// Top-level layout of an `xpconnect` TOML file
///
/// ```toml
/// [connector]
/// host = "192.168.1.20"
/// port = 49000
/// max_age_ms = 5000
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub connector: ConnectorConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Resolve the connector settings: file (if any), then flag overrides
pub fn resolve(path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<ConnectorConfig> {
    let mut config = match path {
        Some(path) => FileConfig::load(path)?.connector,
        None => ConnectorConfig::default(),
    };
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    Ok(config)
}
