//! Gateway configuration, loaded from `castor.toml`.

use std::path::{Path, PathBuf};

use {
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use castor_ryver::RyverConfig;

/// Default config file name, checked in the working directory.
const CONFIG_FILENAME: &str = "castor.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to bind to.
    pub bind: String,

    /// Port to listen on.
    pub port: u16,

    /// Path the webhook endpoint is mounted on.
    pub webhook_path: String,

    /// Ryver account configuration.
    pub ryver: RyverConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8427,
            webhook_path: "/webhook".into(),
            ryver: RyverConfig::default(),
        }
    }
}

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<GatewayConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(toml::from_str(&raw)?)
}

/// Load from the given or default location; a missing file falls back to
/// defaults with a debug note, a broken file to defaults with a warning.
pub fn discover_and_load(path: Option<&Path>) -> GatewayConfig {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    if path.exists() {
        match load_config(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                return config;
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    GatewayConfig::default()
}
