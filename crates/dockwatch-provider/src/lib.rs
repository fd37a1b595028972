//! Resource and network controllers for dockwatch
//!
//! A [`ResourceController`] drives the lifecycle of one tracked container
//! (pull or build, install, start, stop, remove) and reports progress through
//! asynchronous notification channels. A [`NetworkController`] manages the
//! shared test network. The Docker implementations are built on bollard.

mod docker;
mod error;
mod network;
mod notify;
mod types;

pub use docker::{connect, DockerResource};
pub use error::*;
pub use network::DockerNetwork;
pub use notify::*;
pub use types::*;

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

/// Lifecycle operations and notifications for one tracked resource
#[async_trait]
pub trait ResourceController: Send + Sync {
    /// Which resource this controller manages
    fn id(&self) -> ResourceId;

    /// Prepare the controller (connect, verify the runtime is reachable)
    async fn init(&self) -> Result<()>;

    /// Make sure the image exists, then create and start the container
    async fn install(&self) -> Result<()>;

    /// Build an image from a local folder; only the project resource builds
    async fn build(&self, source: &Path, image_tag: &str, container_name: &str) -> Result<()> {
        let _ = (source, image_tag, container_name);
        Err(ProviderError::Unsupported(format!(
            "{} does not build images",
            self.id()
        )))
    }

    /// Start the installed container
    async fn container_start(&self) -> Result<()>;

    /// Stop the installed container
    async fn container_stop(&self) -> Result<()>;

    /// Force-remove every container whose name contains `pattern`
    async fn remove_all_by_name_contains(&self, pattern: &str) -> Result<()>;

    /// Remove the resource's image
    async fn image_remove(&self) -> Result<()>;

    /// Remove the resource's container; a missing container is not an error
    async fn remove_container(&self) -> Result<()>;

    /// Container-ready signals. `None` once taken.
    fn take_ready_channel(&self) -> Option<mpsc::Receiver<()>>;

    /// Build/pull progress events. `None` once taken.
    fn take_event_channel(&self) -> Option<mpsc::Receiver<ProgressEvent>>;

    /// Inspect-available signals. `None` once taken.
    fn take_inspect_channel(&self) -> Option<mpsc::Receiver<()>>;

    /// Most recent inspect snapshot
    fn last_inspect(&self) -> InspectSummary;

    /// Most recent log tail
    fn last_logs(&self) -> String;
}

/// The shared test network
#[async_trait]
pub trait NetworkController: Send + Sync {
    /// Create a bridge network with the given subnet and gateway
    async fn network_create(&self, name: &str, cidr: &str, gateway: &str) -> Result<()>;

    /// Remove the network; a missing network is not an error
    async fn remove(&self) -> Result<()>;
}
