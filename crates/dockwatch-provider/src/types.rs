//! Common types shared by controllers and the status core

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A tracked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceId {
    Nats,
    Project,
}

impl ResourceId {
    pub fn all() -> &'static [ResourceId] {
        &[ResourceId::Nats, ResourceId::Project]
    }

    /// Human-facing label used in panel titles
    pub fn label(&self) -> &'static str {
        match self {
            ResourceId::Nats => "NATS",
            ResourceId::Project => "Project",
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nats => write!(f, "nats"),
            Self::Project => write!(f, "project"),
        }
    }
}

impl std::str::FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nats" => Ok(Self::Nats),
            "project" => Ok(Self::Project),
            _ => Err(format!("Unknown resource: {}", s)),
        }
    }
}

/// Build/pull progress notification.
///
/// Several fields may be set in one event. A percentage of `0.0` means the
/// field was not reported.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressEvent {
    pub image_built: bool,
    pub container_built: bool,
    pub closed: bool,
    pub downloading: f64,
    pub extracting: f64,
}

impl ProgressEvent {
    pub fn downloading(percent: f64) -> Self {
        Self {
            downloading: percent,
            ..Default::default()
        }
    }

    pub fn extracting(percent: f64) -> Self {
        Self {
            extracting: percent,
            ..Default::default()
        }
    }

    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Default::default()
        }
    }

    pub fn image_built() -> Self {
        Self {
            image_built: true,
            ..Default::default()
        }
    }

    pub fn container_built() -> Self {
        Self {
            container_built: true,
            ..Default::default()
        }
    }

    /// Map a Docker pull/build progress line onto an event.
    ///
    /// Only "Downloading" and "Extracting" lines that carry both counters
    /// produce a percentage.
    pub fn from_layer_progress(status: &str, current: Option<i64>, total: Option<i64>) -> Option<Self> {
        let (current, total) = match (current, total) {
            (Some(c), Some(t)) if t > 0 => (c as f64, t as f64),
            _ => return None,
        };
        let percent = (current / total * 100.0).clamp(0.0, 100.0);
        match status {
            "Downloading" => Some(Self::downloading(percent)),
            "Extracting" => Some(Self::extracting(percent)),
            _ => None,
        }
    }
}

/// A published (or merely exposed) container port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    pub protocol: String,
    /// `None` when the port is exposed but not bound on the host
    pub host_port: Option<u16>,
}

impl PortMapping {
    pub fn new(container_port: u16, protocol: impl Into<String>, host_port: Option<u16>) -> Self {
        Self {
            container_port,
            protocol: protocol.into(),
            host_port,
        }
    }

    /// `"port/proto:hostport/proto"`, or `None` for unbound ports
    pub fn binding_label(&self) -> Option<String> {
        self.host_port.map(|host| {
            format!(
                "{}/{}:{}/{}",
                self.container_port, self.protocol, host, self.protocol
            )
        })
    }
}

/// Snapshot of a container's state and network metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectSummary {
    pub state: String,
    pub ports: Vec<PortMapping>,
    pub gateway: String,
    pub ip_address: String,
    pub mac_address: String,
}

/// Everything a Docker-backed controller needs to manage one resource
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub id: ResourceId,
    pub image: String,
    pub container_name: String,
    pub ports: Vec<PortMapping>,
    /// Network the container joins, if any
    pub network: Option<String>,
    pub inspect_interval: Duration,
    pub log_tail_lines: usize,
}

impl ResourceSpec {
    /// NATS resource as described by the global config
    pub fn nats(config: &dockwatch_config::GlobalConfig) -> Self {
        Self {
            id: ResourceId::Nats,
            image: config.nats.image.clone(),
            container_name: config.nats.container_name.clone(),
            ports: to_mappings(&config.nats.ports),
            network: Some(config.network.name.clone()),
            inspect_interval: config.ui.inspect_interval(),
            log_tail_lines: config.ui.log_tail_lines,
        }
    }

    /// Project resource; image and container name are replaced on `build`
    pub fn project(config: &dockwatch_config::GlobalConfig) -> Self {
        Self {
            id: ResourceId::Project,
            image: config.project.image_tag.clone(),
            container_name: config.project.container_name.clone(),
            ports: to_mappings(&config.project.ports),
            network: Some(config.network.name.clone()),
            inspect_interval: config.ui.inspect_interval(),
            log_tail_lines: config.ui.log_tail_lines,
        }
    }
}

fn to_mappings(ports: &[dockwatch_config::PortConfig]) -> Vec<PortMapping> {
    ports
        .iter()
        .map(|p| PortMapping::new(p.container_port, p.protocol.clone(), Some(p.host_port)))
        .collect()
}
