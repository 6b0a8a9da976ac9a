use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the three collection documents
    /// (`genericGlyphs.json`, `dreamSeeds.json`, `users.json`).
    /// Overridden at runtime by the `GLYPHDB_DATA_DIR` environment variable
    /// when set.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(dir) = env::var("GLYPHDB_DATA_DIR") {
            if !dir.is_empty() {
                config.storage.data_dir = dir;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:3000");
        assert_eq!(cfg.telemetry.log_level, "info");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.storage.data_dir, "data");
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join("default.toml");

        let mut cfg = AppConfig::default();
        cfg.storage.data_dir = "/var/lib/glyphdb".to_string();
        cfg.server.bind_addr = "0.0.0.0:8080".to_string();
        cfg.save_to(&path).unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.storage.data_dir, "/var/lib/glyphdb");
        assert_eq!(reloaded.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(reloaded.telemetry.log_level, "info");
    }

    #[test]
    fn partial_file_fills_missing_sections_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("default.toml");
        fs::write(&path, "[server]\nbind_addr = \"127.0.0.1:4000\"\n").unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:4000");
        assert_eq!(cfg.storage.data_dir, "data");
    }
}
