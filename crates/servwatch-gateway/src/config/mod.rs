//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use servwatch_core::error::{Result, ServWatchError};

pub use schema::{GatewayConfig, GatewaySection, SeedServer, SignalsSection, SimulatorSection};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SERVWATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "servwatch.yaml";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ServWatchError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| ServWatchError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load from `$SERVWATCH_CONFIG` (or `servwatch.yaml`), falling back to
/// defaults when the file does not exist. A file that exists but fails to
/// parse is still an error.
pub fn load_or_default() -> Result<GatewayConfig> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    if Path::new(&path).exists() {
        load_from_file(&path)
    } else {
        tracing::warn!(%path, "config file not found, using defaults");
        let cfg = GatewayConfig::default();
        cfg.validate()?;
        Ok(cfg)
    }
}
