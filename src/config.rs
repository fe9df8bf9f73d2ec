use serde::Deserialize;
use std::path::Path;

/// Top-level configuration loaded from sofia-dashboard.toml.
#[derive(Debug, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct DashboardConfig {
    pub upstream: UpstreamConfig,
    pub refresh: RefreshConfig,
    pub serve: ServeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Exposition endpoint of the Sofia AI upstream.
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
}

// --- Default implementations ---

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/metrics".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Load config from the given path, falling back to defaults when the file
/// is missing or unreadable.
pub fn load_config(path: &Path) -> DashboardConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("failed to parse {}: {e}", path.display());
                DashboardConfig::default()
            }
        },
        Err(_) => DashboardConfig::default(),
    }
}
