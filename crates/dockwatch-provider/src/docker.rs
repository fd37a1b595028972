//! Docker resource controller using bollard

use crate::{
    notification_channels, InspectSummary, NotificationSlots, PortMapping, ProgressEvent,
    ProviderError, ResourceController, ResourceId, ResourceNotifier, ResourceSpec, Result,
};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::{BuildImageOptions, CreateImageOptions, RemoveImageOptions};
use bollard::network::InspectNetworkOptions;
use bollard::service::{ContainerInspectResponse, HostConfig, PortBinding};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Connect to the Docker daemon at `socket_path` (unix socket or http URL)
pub fn connect(socket_path: &str, timeout_secs: u64) -> Result<Docker> {
    let client = if socket_path.starts_with("http://") || socket_path.starts_with("https://") {
        Docker::connect_with_http(socket_path, timeout_secs, bollard::API_DEFAULT_VERSION)
    } else {
        let path = socket_path.trim_start_matches("unix://");
        Docker::connect_with_socket(path, timeout_secs, bollard::API_DEFAULT_VERSION)
    };
    client.map_err(|e| ProviderError::ConnectionError(e.to_string()))
}

/// Image and container currently managed; `build` replaces both
#[derive(Debug, Clone)]
struct Target {
    image: String,
    container_name: String,
}

#[derive(Debug, Default)]
struct Snapshot {
    inspect: InspectSummary,
    logs: String,
}

/// One tracked resource backed by a Docker container
pub struct DockerResource {
    client: Docker,
    spec: ResourceSpec,
    target: Mutex<Target>,
    notifier: ResourceNotifier,
    slots: NotificationSlots,
    snapshot: Arc<Mutex<Snapshot>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl DockerResource {
    pub fn new(client: Docker, spec: ResourceSpec) -> Self {
        let (notifier, slots) = notification_channels();
        let target = Target {
            image: spec.image.clone(),
            container_name: spec.container_name.clone(),
        };
        Self {
            client,
            spec,
            target: Mutex::new(target),
            notifier,
            slots,
            snapshot: Arc::new(Mutex::new(Snapshot::default())),
            monitor: Mutex::new(None),
        }
    }

    fn target(&self) -> Target {
        lock(&self.target).clone()
    }

    /// Pull the image unless it is already present
    async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.client.inspect_image(image).await.is_ok() {
            tracing::debug!(resource = %self.spec.id, "image {} already present", image);
        } else {
            self.pull(image).await?;
        }
        self.notifier.progress(ProgressEvent::closed()).await;
        Ok(())
    }

    async fn pull(&self, image: &str) -> Result<()> {
        tracing::info!(resource = %self.spec.id, "pulling {}", image);

        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };
        let mut stream = self.client.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| ProviderError::ImageNotFound(format!("{}: {}", image, e)))?;
            if let Some(error) = info.error {
                return Err(ProviderError::ImageNotFound(error));
            }
            if let (Some(status), Some(detail)) = (info.status.as_deref(), info.progress_detail.as_ref()) {
                if let Some(event) =
                    ProgressEvent::from_layer_progress(status, detail.current, detail.total)
                {
                    self.notifier.progress(event).await;
                }
            }
        }

        Ok(())
    }

    /// Attach to the configured network only if it exists
    async fn network_mode(&self) -> Option<String> {
        let name = self.spec.network.as_deref()?;
        match self
            .client
            .inspect_network(name, None::<InspectNetworkOptions<String>>)
            .await
        {
            Ok(_) => Some(name.to_string()),
            Err(e) => {
                tracing::warn!(
                    resource = %self.spec.id,
                    "network {} unavailable, using the default network: {}",
                    name,
                    e
                );
                None
            }
        }
    }

    async fn create_container(&self, target: &Target) -> Result<()> {
        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();

        for port in &self.spec.ports {
            let container_port = format!("{}/{}", port.container_port, port.protocol);
            exposed_ports.insert(container_port.clone(), HashMap::new());
            if let Some(host_port) = port.host_port {
                let binding = PortBinding {
                    host_ip: None,
                    host_port: Some(host_port.to_string()),
                };
                port_bindings.insert(container_port, Some(vec![binding]));
            }
        }

        let host_config = HostConfig {
            port_bindings: if port_bindings.is_empty() {
                None
            } else {
                Some(port_bindings)
            },
            network_mode: self.network_mode().await,
            ..Default::default()
        };

        let config = Config {
            image: Some(target.image.clone()),
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: target.container_name.as_str(),
            platform: None,
        };
        self.client.create_container(Some(options), config).await?;
        self.notifier.progress(ProgressEvent::container_built()).await;
        Ok(())
    }

    async fn remove_named(&self, name: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        ignore_not_found(self.client.remove_container(name, Some(options)).await)
    }

    /// Inspect the container periodically and publish inspect-available
    fn start_monitor(&self, container_name: &str) {
        let client = self.client.clone();
        let name = container_name.to_string();
        let snapshot = Arc::clone(&self.snapshot);
        let notifier = self.notifier.clone();
        let interval = self.spec.inspect_interval;
        let tail = self.spec.log_tail_lines;
        let network = self.spec.network.clone();
        let resource = self.spec.id;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let info = match client.inspect_container(&name, None).await {
                    Ok(info) => info,
                    Err(e) => {
                        let err = ProviderError::from(e);
                        if err.is_not_found() {
                            tracing::debug!(%resource, "container {} is gone, monitor stopped", name);
                            break;
                        }
                        tracing::warn!(%resource, "inspect of {} failed: {}", name, err);
                        continue;
                    }
                };
                let inspect = summarize_inspect(&info, network.as_deref());
                let logs = match read_log_tail(&client, &name, tail).await {
                    Ok(logs) => logs,
                    Err(e) => {
                        tracing::debug!(%resource, "log read of {} failed: {}", name, e);
                        String::new()
                    }
                };

                {
                    let mut snap = lock(&snapshot);
                    snap.inspect = inspect;
                    snap.logs = logs;
                }
                notifier.inspect_available();
            }
        });

        if let Some(previous) = lock(&self.monitor).replace(handle) {
            previous.abort();
        }
    }

    fn stop_monitor(&self) {
        if let Some(handle) = lock(&self.monitor).take() {
            handle.abort();
        }
    }
}

impl Drop for DockerResource {
    fn drop(&mut self) {
        self.stop_monitor();
    }
}

#[async_trait]
impl ResourceController for DockerResource {
    fn id(&self) -> ResourceId {
        self.spec.id
    }

    async fn init(&self) -> Result<()> {
        self.client
            .ping()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;
        Ok(())
    }

    async fn install(&self) -> Result<()> {
        let target = self.target();
        self.stop_monitor();

        self.ensure_image(&target.image).await?;
        self.remove_named(&target.container_name).await?;
        self.create_container(&target).await?;

        self.client
            .start_container(&target.container_name, None::<StartContainerOptions<String>>)
            .await?;
        tracing::info!(resource = %self.spec.id, "container {} started", target.container_name);

        self.notifier.ready().await;
        self.start_monitor(&target.container_name);
        Ok(())
    }

    async fn build(&self, source: &Path, image_tag: &str, container_name: &str) -> Result<()> {
        tracing::info!(resource = %self.spec.id, "building {} from {}", image_tag, source.display());

        let context = source.to_path_buf();
        let tar_data = tokio::task::spawn_blocking(move || create_build_context(&context))
            .await
            .map_err(|e| ProviderError::RuntimeError(e.to_string()))??;

        let options = BuildImageOptions {
            dockerfile: "Dockerfile".to_string(),
            t: image_tag.to_string(),
            rm: true,
            ..Default::default()
        };

        let mut stream = self.client.build_image(options, None, Some(tar_data.into()));

        while let Some(result) = stream.next().await {
            let output = result.map_err(|e| ProviderError::BuildError(e.to_string()))?;
            if let Some(error) = output.error {
                return Err(ProviderError::BuildError(error));
            }
            if let Some(line) = output.stream {
                tracing::debug!(resource = %self.spec.id, "{}", line.trim_end());
            }
            if let (Some(status), Some(detail)) =
                (output.status.as_deref(), output.progress_detail.as_ref())
            {
                if let Some(event) =
                    ProgressEvent::from_layer_progress(status, detail.current, detail.total)
                {
                    self.notifier.progress(event).await;
                }
            }
        }

        *lock(&self.target) = Target {
            image: image_tag.to_string(),
            container_name: container_name.to_string(),
        };
        self.notifier.progress(ProgressEvent::image_built()).await;
        Ok(())
    }

    async fn container_start(&self) -> Result<()> {
        let target = self.target();
        self.client
            .start_container(&target.container_name, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn container_stop(&self) -> Result<()> {
        let target = self.target();
        self.client
            .stop_container(&target.container_name, Some(StopContainerOptions { t: 10 }))
            .await?;
        Ok(())
    }

    async fn remove_all_by_name_contains(&self, pattern: &str) -> Result<()> {
        let options = ListContainersOptions::<String> {
            all: true,
            filters: HashMap::from([("name".to_string(), vec![pattern.to_string()])]),
            ..Default::default()
        };
        let containers = self.client.list_containers(Some(options)).await?;

        for container in containers {
            let names = container.names.unwrap_or_default();
            // The daemon's name filter is a regex; keep only literal matches
            if !names.iter().any(|n| n.contains(pattern)) {
                continue;
            }
            if let Some(id) = container.id {
                tracing::info!(resource = %self.spec.id, "removing {:?}", names);
                self.remove_named(&id).await?;
            }
        }

        if self.target().container_name.contains(pattern) {
            self.stop_monitor();
        }
        Ok(())
    }

    async fn image_remove(&self) -> Result<()> {
        let target = self.target();
        let options = RemoveImageOptions {
            force: true,
            ..Default::default()
        };
        self.client
            .remove_image(&target.image, Some(options), None)
            .await
            .map_err(|e| {
                let err = ProviderError::from(e);
                if err.is_not_found() {
                    ProviderError::ImageNotFound(target.image.clone())
                } else {
                    err
                }
            })?;
        Ok(())
    }

    async fn remove_container(&self) -> Result<()> {
        let target = self.target();
        self.stop_monitor();
        self.remove_named(&target.container_name).await
    }

    fn take_ready_channel(&self) -> Option<mpsc::Receiver<()>> {
        self.slots.take_ready()
    }

    fn take_event_channel(&self) -> Option<mpsc::Receiver<ProgressEvent>> {
        self.slots.take_events()
    }

    fn take_inspect_channel(&self) -> Option<mpsc::Receiver<()>> {
        self.slots.take_inspect()
    }

    fn last_inspect(&self) -> InspectSummary {
        lock(&self.snapshot).inspect.clone()
    }

    fn last_logs(&self) -> String {
        lock(&self.snapshot).logs.clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn ignore_not_found<T>(result: std::result::Result<T, bollard::errors::Error>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            let err = ProviderError::from(e);
            if err.is_not_found() {
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

/// Reduce a full inspect response to the fields the status view shows.
///
/// Containers attached to a user network report their addresses under
/// `networks`; the top-level fields are empty in that case.
pub(crate) fn summarize_inspect(
    info: &ContainerInspectResponse,
    preferred_network: Option<&str>,
) -> InspectSummary {
    let state = info
        .state
        .as_ref()
        .and_then(|s| s.status)
        .map(|s| format!("{:?}", s).to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());

    let mut summary = InspectSummary {
        state,
        ..Default::default()
    };

    let Some(network) = &info.network_settings else {
        return summary;
    };

    if let Some(port_map) = &network.ports {
        for (container_port, bindings) in port_map {
            let mut parts = container_port.split('/');
            let port: u16 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
            let protocol = parts.next().unwrap_or("tcp");
            let host_port = bindings
                .as_ref()
                .and_then(|b| b.first())
                .and_then(|b| b.host_port.as_ref())
                .and_then(|p| p.parse().ok());
            summary.ports.push(PortMapping::new(port, protocol, host_port));
        }
    }

    summary.gateway = network.gateway.clone().unwrap_or_default();
    summary.ip_address = network.ip_address.clone().unwrap_or_default();
    summary.mac_address = network.mac_address.clone().unwrap_or_default();

    if summary.ip_address.is_empty() {
        if let Some(networks) = &network.networks {
            let endpoint = preferred_network
                .and_then(|name| networks.get(name))
                .or_else(|| {
                    let mut names: Vec<&String> = networks.keys().collect();
                    names.sort();
                    names.first().and_then(|name| networks.get(*name))
                });
            if let Some(endpoint) = endpoint {
                summary.gateway = endpoint.gateway.clone().unwrap_or_default();
                summary.ip_address = endpoint.ip_address.clone().unwrap_or_default();
                summary.mac_address = endpoint.mac_address.clone().unwrap_or_default();
            }
        }
    }

    summary
}

async fn read_log_tail(client: &Docker, name: &str, tail: usize) -> Result<String> {
    let options = LogsOptions::<String> {
        stdout: true,
        stderr: true,
        tail: tail.to_string(),
        ..Default::default()
    };

    let mut stream = client.logs(name, Some(options));
    let mut output = String::new();
    while let Some(chunk) = stream.next().await {
        match chunk? {
            LogOutput::StdOut { message }
            | LogOutput::StdErr { message }
            | LogOutput::Console { message } => {
                output.push_str(&String::from_utf8_lossy(&message));
            }
            LogOutput::StdIn { .. } => {}
        }
    }
    Ok(output)
}

/// Create a tar archive of the build context
fn create_build_context(context: &Path) -> Result<Vec<u8>> {
    use std::io::Cursor;
    use tar::Builder;

    if !context.join("Dockerfile").is_file() {
        return Err(ProviderError::BuildError(format!(
            "no Dockerfile in {}",
            context.display()
        )));
    }

    let mut tar_data = Vec::new();
    {
        let cursor = Cursor::new(&mut tar_data);
        let mut builder = Builder::new(cursor);
        add_dir_to_tar(&mut builder, context, Path::new(""))?;
        builder.finish()?;
    }

    Ok(tar_data)
}

/// Recursively add directory contents to tar
fn add_dir_to_tar<W: Write>(builder: &mut tar::Builder<W>, base: &Path, prefix: &Path) -> Result<()> {
    for entry in std::fs::read_dir(base)? {
        let entry = entry?;
        let path = entry.path();
        let name = prefix.join(entry.file_name());

        let file_name = entry.file_name();
        let file_name_str = file_name.to_string_lossy();
        if file_name_str == ".git" || file_name_str == "target" || file_name_str == "node_modules" {
            continue;
        }

        if path.is_dir() {
            add_dir_to_tar(builder, &path, &name)?;
        } else if path.is_file() {
            builder.append_path_with_name(&path, &name)?;
        }
    }

    Ok(())
}
