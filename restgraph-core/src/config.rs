//! # Client configuration
//!
//! Connection defaults shared by the CLI and embedders: service location, tenant, default headers
//! and timeout. Persisted as JSON in the platform config directory.
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Failed to access '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the service (e.g. `https://api.example.com/content`).
    pub location: Option<String>,
    /// Owner of the resources, sent as `owner=<tenant>` on every request.
    pub tenant: Option<String>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Overlays the `Some` values and headers of `other` on top of `self`.
    pub fn merge(mut self, other: ClientConfig) -> Self {
        if other.location.is_some() {
            self.location = other.location;
        }
        if other.tenant.is_some() {
            self.tenant = other.tenant;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        for (key, value) in other.headers {
            self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
            self.headers.push((key, value));
        }
        self
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        let proj_dirs =
            ProjectDirs::from("com", "restgraph", "restgraph").ok_or(ConfigError::NoConfigDir)?;
        let config_dir = proj_dirs.config_dir();
        fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io(config_dir.to_path_buf(), e))?;

        Ok(Self::at(config_dir.join("config.json")))
    }

    /// Uses an explicit file instead of the platform config directory.
    pub fn at(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// The descriptor cache file, kept next to the config file.
    pub fn descriptor_cache_path(&self) -> PathBuf {
        self.config_path.with_file_name("descriptors.json")
    }

    pub fn load(&self) -> Result<ClientConfig, ConfigError> {
        if !self.config_path.exists() {
            return Ok(ClientConfig::default());
        }
        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::Io(self.config_path.clone(), e))?;
        let config = serde_json::from_str(&content).unwrap_or_default();
        Ok(config)
    }

    pub fn save(&self, config: &ClientConfig) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, content)
            .map_err(|e| ConfigError::Io(self.config_path.clone(), e))?;
        Ok(())
    }
}
