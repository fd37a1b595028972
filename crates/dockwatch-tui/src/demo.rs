//! Demo mode: scripted controllers so the UI runs without a container runtime

use async_trait::async_trait;
use dockwatch_config::GlobalConfig;
use dockwatch_provider::{
    notification_channels, InspectSummary, NetworkController, NotificationSlots, PortMapping,
    ProgressEvent, ProviderError, ResourceController, ResourceId, ResourceNotifier, Result,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const STEP: Duration = Duration::from_millis(120);

#[derive(Debug, Default)]
struct DemoState {
    installed: bool,
    running: bool,
    image_present: bool,
    inspect: InspectSummary,
    logs: VecDeque<String>,
    log_line: usize,
}

impl DemoState {
    /// Append one log line, keeping at most `limit` lines
    fn push_log(&mut self, line: String, limit: usize) {
        self.logs.push_back(line);
        while self.logs.len() > limit {
            self.logs.pop_front();
        }
    }

    fn log_tail(&self) -> String {
        self.logs.iter().map(|line| format!("{}\n", line)).collect()
    }
}

/// A resource that plays back a pull/start sequence on a timer
pub struct DemoResource {
    id: ResourceId,
    container_name: String,
    ports: Vec<PortMapping>,
    address: u8,
    log_limit: usize,
    notifier: ResourceNotifier,
    slots: NotificationSlots,
    state: Arc<Mutex<DemoState>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl DemoResource {
    fn new(
        id: ResourceId,
        container_name: String,
        ports: Vec<PortMapping>,
        address: u8,
        log_limit: usize,
    ) -> Self {
        let (notifier, slots) = notification_channels();
        Self {
            id,
            container_name,
            ports,
            address,
            log_limit: log_limit.max(1),
            notifier,
            slots,
            state: Arc::new(Mutex::new(DemoState::default())),
            monitor: Mutex::new(None),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, DemoState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn play_pull(&self) {
        for percent in (10..=100).step_by(15) {
            self.notifier
                .progress(ProgressEvent::downloading(percent as f64))
                .await;
            tokio::time::sleep(STEP).await;
        }
        for percent in (20..=100).step_by(20) {
            self.notifier
                .progress(ProgressEvent::extracting(percent as f64))
                .await;
            tokio::time::sleep(STEP).await;
        }
    }

    /// Fake inspect/log source, refreshed every second while running
    fn start_monitor(&self) {
        let state = Arc::clone(&self.state);
        let notifier = self.notifier.clone();
        let id = self.id;
        let limit = self.log_limit;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                {
                    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
                    state.inspect.state = if state.running { "running" } else { "exited" }.to_string();
                    if state.running {
                        state.log_line += 1;
                        let line = format!(
                            "\u{1b}[32m[INF]\u{1b}[0m {} heartbeat {}",
                            id, state.log_line
                        );
                        state.push_log(line, limit);
                    }
                }
                notifier.inspect_available();
            }
        });
        if let Some(old) = self.monitor.lock().unwrap_or_else(|e| e.into_inner()).replace(handle) {
            old.abort();
        }
    }

    fn stop_monitor(&self) {
        if let Some(handle) = self.monitor.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

impl Drop for DemoResource {
    fn drop(&mut self) {
        self.stop_monitor();
    }
}

#[async_trait]
impl ResourceController for DemoResource {
    fn id(&self) -> ResourceId {
        self.id
    }

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn install(&self) -> Result<()> {
        let need_pull = !self.state().image_present;
        if need_pull {
            self.play_pull().await;
        }
        self.notifier.progress(ProgressEvent::closed()).await;
        tokio::time::sleep(STEP).await;
        self.notifier.progress(ProgressEvent::container_built()).await;
        tokio::time::sleep(STEP).await;

        {
            let mut state = self.state();
            state.image_present = true;
            state.installed = true;
            state.running = true;
            state.inspect = InspectSummary {
                state: "running".to_string(),
                ports: self.ports.clone(),
                gateway: "12.0.0.1".to_string(),
                ip_address: format!("12.0.0.{}", self.address),
                mac_address: format!("02:42:0c:00:00:{:02x}", self.address),
            };
            state.logs.clear();
            state.push_log(format!("{} started", self.container_name), self.log_limit);
        }
        self.notifier.ready().await;
        self.start_monitor();
        Ok(())
    }

    async fn build(&self, source: &Path, image_tag: &str, container_name: &str) -> Result<()> {
        if self.id != ResourceId::Project {
            return Err(ProviderError::Unsupported(format!("{} does not build images", self.id)));
        }
        tracing::info!("demo build of {} from {}", image_tag, source.display());
        self.play_pull().await;
        self.state().image_present = true;
        self.notifier.progress(ProgressEvent::image_built()).await;
        tracing::debug!("demo container name {}", container_name);
        Ok(())
    }

    async fn container_start(&self) -> Result<()> {
        let mut state = self.state();
        if !state.installed {
            return Err(ProviderError::ContainerNotFound(self.container_name.clone()));
        }
        state.running = true;
        Ok(())
    }

    async fn container_stop(&self) -> Result<()> {
        let mut state = self.state();
        if !state.installed {
            return Err(ProviderError::ContainerNotFound(self.container_name.clone()));
        }
        state.running = false;
        Ok(())
    }

    async fn remove_all_by_name_contains(&self, pattern: &str) -> Result<()> {
        if self.container_name.contains(pattern) {
            self.remove_container().await?;
        }
        Ok(())
    }

    async fn image_remove(&self) -> Result<()> {
        let mut state = self.state();
        if state.installed {
            return Err(ProviderError::RuntimeError(format!(
                "image is being used by container {}",
                self.container_name
            )));
        }
        state.image_present = false;
        Ok(())
    }

    async fn remove_container(&self) -> Result<()> {
        self.stop_monitor();
        let mut state = self.state();
        state.installed = false;
        state.running = false;
        state.inspect = InspectSummary::default();
        Ok(())
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
        self.state().inspect.clone()
    }

    fn last_logs(&self) -> String {
        self.state().log_tail()
    }
}

/// Network that always succeeds
#[derive(Debug, Default)]
pub struct DemoNetwork;

#[async_trait]
impl NetworkController for DemoNetwork {
    async fn network_create(&self, name: &str, cidr: &str, gateway: &str) -> Result<()> {
        tracing::info!("demo network {} ({} via {})", name, cidr, gateway);
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        Ok(())
    }
}

/// NATS, project and network controllers for demo mode
pub fn demo_controllers(
    config: &GlobalConfig,
) -> (
    Arc<dyn ResourceController>,
    Arc<dyn ResourceController>,
    Arc<dyn NetworkController>,
) {
    let ports = |list: &[dockwatch_config::PortConfig]| {
        list.iter()
            .map(|p| PortMapping::new(p.container_port, p.protocol.clone(), Some(p.host_port)))
            .collect::<Vec<_>>()
    };
    let nats = DemoResource::new(
        ResourceId::Nats,
        config.nats.container_name.clone(),
        ports(&config.nats.ports),
        2,
        config.ui.log_tail_lines,
    );
    let project = DemoResource::new(
        ResourceId::Project,
        config.project.container_name.clone(),
        ports(&config.project.ports),
        3,
        config.ui.log_tail_lines,
    );
    (Arc::new(nats), Arc::new(project), Arc::new(DemoNetwork))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_install_plays_progress_then_ready() {
        let (nats, _, _) = demo_controllers(&GlobalConfig::default());
        let mut events = nats.take_event_channel().unwrap();
        let mut ready = nats.take_ready_channel().unwrap();

        nats.install().await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(seen.iter().any(|e| e.downloading == 100.0));
        assert!(seen.iter().any(|e| e.closed));
        assert_eq!(seen.last(), Some(&ProgressEvent::container_built()));
        assert!(ready.try_recv().is_ok());
        assert_eq!(nats.last_inspect().state, "running");
        assert_eq!(nats.last_inspect().ip_address, "12.0.0.2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_in_use_cannot_be_removed() {
        let (nats, _, _) = demo_controllers(&GlobalConfig::default());
        assert!(nats.container_stop().await.is_err());

        nats.install().await.unwrap();
        assert!(nats.container_stop().await.is_ok());
        let err = nats.image_remove().await.unwrap_err();
        assert!(err.to_string().contains("container_nats_delete_after_test"));

        nats.remove_all_by_name_contains("nats_delete").await.unwrap();
        assert!(nats.image_remove().await.is_ok());
        assert_eq!(nats.last_inspect(), InspectSummary::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_project_builds() {
        let (nats, project, _) = demo_controllers(&GlobalConfig::default());
        let source = Path::new("./projectUnderTest/queue");
        assert!(matches!(
            nats.build(source, "tag", "name").await,
            Err(ProviderError::Unsupported(_))
        ));

        let mut events = project.take_event_channel().unwrap();
        assert!(project.build(source, "tag", "name").await.is_ok());
        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert_eq!(last, Some(ProgressEvent::image_built()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_tail_is_bounded() {
        let mut config = GlobalConfig::default();
        config.ui.log_tail_lines = 5;
        let (nats, _, _) = demo_controllers(&config);
        nats.install().await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;

        let logs = nats.last_logs();
        assert_eq!(logs.lines().count(), 5);
        assert!(logs.ends_with('\n'));
        assert!(!logs.contains("started"));
        assert!(logs.lines().last().unwrap().contains("heartbeat"));
    }
}
