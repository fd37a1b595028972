//! Subcommand implementations

use dockwatch_config::GlobalConfig;
use dockwatch_provider::{
    connect, DockerNetwork, DockerResource, NetworkController, ResourceController, ResourceSpec,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Resolved configuration as TOML
pub fn config(config: &GlobalConfig) -> anyhow::Result<String> {
    Ok(config.to_toml()?)
}

/// Connect to Docker and run the TUI against the configured containers
pub async fn tui(config: &GlobalConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    let client = connect(&config.docker.socket, config.docker.timeout_secs)?;
    tracing::info!("using Docker at {}", config.docker.socket);

    let nats: Arc<dyn ResourceController> =
        Arc::new(DockerResource::new(client.clone(), ResourceSpec::nats(config)));
    let project: Arc<dyn ResourceController> =
        Arc::new(DockerResource::new(client.clone(), ResourceSpec::project(config)));
    let network: Arc<dyn NetworkController> =
        Arc::new(DockerNetwork::new(client, config.network.name.clone()));

    dockwatch_tui::run(nats, project, network, config, cancel).await?;
    Ok(())
}
