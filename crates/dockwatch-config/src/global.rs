//! Global configuration for dockwatch
//!
//! Located at `~/.config/dockwatch/config.toml`

use crate::{ConfigError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global dockwatch configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub docker: DockerConfig,
    pub ui: UiConfig,
    pub network: NetworkConfig,
    pub nats: NatsConfig,
    pub project: ProjectConfig,
}

/// Docker connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Docker socket path or `http://` URL
    pub socket: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: default_docker_socket(),
            timeout_secs: 120,
        }
    }
}

#[cfg(windows)]
fn default_docker_socket() -> String {
    "//./pipe/docker_engine".to_string()
}

#[cfg(not(windows))]
fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

/// Refresh rates for the status view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Status heartbeat: progress is reset and republished at this rate
    pub tick_ms: u64,
    /// How often a running container is inspected
    pub inspect_interval_ms: u64,
    /// Number of log lines kept for the log panel
    pub log_tail_lines: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            inspect_interval_ms: 1000,
            log_tail_lines: 50,
        }
    }
}

impl UiConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn inspect_interval(&self) -> Duration {
        Duration::from_millis(self.inspect_interval_ms)
    }
}

/// Network recreated on every NATS install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub name: String,
    pub cidr: String,
    pub gateway: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "cache_delete_after_test".to_string(),
            cidr: "12.0.0.0/16".to_string(),
            gateway: "12.0.0.1".to_string(),
        }
    }
}

/// A published port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub container_port: u16,
    pub host_port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "tcp".to_string()
}

impl PortConfig {
    pub fn tcp(container_port: u16, host_port: u16) -> Self {
        Self {
            container_port,
            host_port,
            protocol: default_protocol(),
        }
    }
}

/// The NATS support container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub image: String,
    pub container_name: String,
    /// Substring used to sweep leftover containers before an install
    pub stale_name_filter: String,
    pub ports: Vec<PortConfig>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            image: "nats:latest".to_string(),
            container_name: "container_nats_delete_after_test".to_string(),
            stale_name_filter: "nats_delete".to_string(),
            ports: vec![PortConfig::tcp(4222, 4222), PortConfig::tcp(8222, 8222)],
        }
    }
}

/// The project under test, built from a local folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub source_path: PathBuf,
    pub image_tag: String,
    pub container_name: String,
    pub ports: Vec<PortConfig>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("./projectUnderTest/queue"),
            image_tag: "image_delete_queue_test:latest".to_string(),
            container_name: "container_delete_queue_1_test".to_string(),
            ports: Vec::new(),
        }
    }
}

impl GlobalConfig {
    /// Load global configuration from the default path
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load global configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;

        tracing::debug!(
            "Loaded config from {:?}: tick_ms={}, network={}",
            path,
            config.ui.tick_ms,
            config.network.name
        );

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = self.to_toml()?;

        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.ui.tick_ms == 0 {
            return Err(ConfigError::Invalid("ui.tick_ms must be greater than 0".into()));
        }
        if self.ui.inspect_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "ui.inspect_interval_ms must be greater than 0".into(),
            ));
        }
        if self.network.name.is_empty() {
            return Err(ConfigError::Invalid("network.name must not be empty".into()));
        }
        if self.nats.stale_name_filter.is_empty() {
            // An empty filter would match every container on the host
            return Err(ConfigError::Invalid(
                "nats.stale_name_filter must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "dockwatch").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path (log files live here)
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "dockwatch").ok_or(ConfigError::NoDataDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}
