//! Test support utilities for dockwatch-core
//!
//! Provides mock controllers and a recording view sink so aggregation and
//! dispatch can be tested without a Docker daemon or a terminal.

use crate::{ModalChoice, ViewError, ViewSink};
use async_trait::async_trait;
use dockwatch_provider::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

/// Records which methods were called on the mocks
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Init { id: ResourceId },
    Install { id: ResourceId },
    Build { id: ResourceId, source: PathBuf, tag: String, name: String },
    Start { id: ResourceId },
    Stop { id: ResourceId },
    RemoveAllByNameContains { id: ResourceId, pattern: String },
    ImageRemove { id: ResourceId },
    RemoveContainer { id: ResourceId },
    NetworkCreate { name: String, cidr: String, gateway: String },
    NetworkRemove,
}

/// Call log shared between mocks so ordering across them can be asserted
pub type CallLog = Arc<Mutex<Vec<MockCall>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Configurable mock resource controller
pub struct MockController {
    id: ResourceId,
    pub calls: CallLog,
    notifier: ResourceNotifier,
    slots: NotificationSlots,
    pub init_result: Arc<Mutex<Result<()>>>,
    pub install_result: Arc<Mutex<Result<()>>>,
    pub build_result: Arc<Mutex<Result<()>>>,
    pub start_result: Arc<Mutex<Result<()>>>,
    pub stop_result: Arc<Mutex<Result<()>>>,
    pub remove_by_name_result: Arc<Mutex<Result<()>>>,
    pub image_remove_result: Arc<Mutex<Result<()>>>,
    pub remove_container_result: Arc<Mutex<Result<()>>>,
    pub inspect: Arc<Mutex<InspectSummary>>,
    pub logs: Arc<Mutex<String>>,
    /// How long each operation takes before it returns
    pub delay: Arc<Mutex<Duration>>,
    /// Operations that ran to completion
    pub completed: Arc<AtomicUsize>,
}

impl MockController {
    /// Create a mock with default success results and its own call log
    pub fn new(id: ResourceId) -> Self {
        Self::with_log(id, call_log())
    }

    /// Create a mock recording into `calls`
    pub fn with_log(id: ResourceId, calls: CallLog) -> Self {
        let (notifier, slots) = notification_channels();
        Self {
            id,
            calls,
            notifier,
            slots,
            init_result: ok(),
            install_result: ok(),
            build_result: ok(),
            start_result: ok(),
            stop_result: ok(),
            remove_by_name_result: ok(),
            image_remove_result: ok(),
            remove_container_result: ok(),
            inspect: Arc::new(Mutex::new(InspectSummary::default())),
            logs: Arc::new(Mutex::new(String::new())),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sending side of this mock's notification channels
    pub fn notifier(&self) -> ResourceNotifier {
        self.notifier.clone()
    }

    /// Store an inspect snapshot and signal that it is available
    pub fn publish_inspect(&self, summary: InspectSummary, logs: &str) {
        *self.inspect.lock().unwrap() = summary;
        *self.logs.lock().unwrap() = logs.to_string();
        self.notifier.inspect_available();
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Calls recorded in this mock's log
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(&self, result: &Arc<Mutex<Result<()>>>) -> Result<()> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        clone_result(result)
    }

    pub fn was_called(&self, call: &MockCall) -> bool {
        self.calls.lock().unwrap().contains(call)
    }
}

fn ok() -> Arc<Mutex<Result<()>>> {
    Arc::new(Mutex::new(Ok(())))
}

fn clone_result(r: &Arc<Mutex<Result<()>>>) -> Result<()> {
    match &*r.lock().unwrap() {
        Ok(()) => Ok(()),
        Err(e) => Err(clone_provider_error(e)),
    }
}

/// Clone a ProviderError (thiserror types don't implement Clone)
pub fn clone_provider_error(e: &ProviderError) -> ProviderError {
    match e {
        ProviderError::ConnectionError(s) => ProviderError::ConnectionError(s.clone()),
        ProviderError::ContainerNotFound(s) => ProviderError::ContainerNotFound(s.clone()),
        ProviderError::ImageNotFound(s) => ProviderError::ImageNotFound(s.clone()),
        ProviderError::BuildError(s) => ProviderError::BuildError(s.clone()),
        ProviderError::RuntimeError(s) => ProviderError::RuntimeError(s.clone()),
        ProviderError::NetworkError(s) => ProviderError::NetworkError(s.clone()),
        ProviderError::Unsupported(s) => ProviderError::Unsupported(s.clone()),
        ProviderError::IoError(_) => ProviderError::RuntimeError("IO error (cloned)".into()),
        ProviderError::Docker(e) => ProviderError::RuntimeError(e.to_string()),
    }
}

#[async_trait]
impl ResourceController for MockController {
    fn id(&self) -> ResourceId {
        self.id
    }

    async fn init(&self) -> Result<()> {
        self.record(MockCall::Init { id: self.id });
        self.respond(&self.init_result).await
    }

    async fn install(&self) -> Result<()> {
        self.record(MockCall::Install { id: self.id });
        self.respond(&self.install_result).await
    }

    async fn build(&self, source: &Path, image_tag: &str, container_name: &str) -> Result<()> {
        self.record(MockCall::Build {
            id: self.id,
            source: source.to_path_buf(),
            tag: image_tag.to_string(),
            name: container_name.to_string(),
        });
        self.respond(&self.build_result).await
    }

    async fn container_start(&self) -> Result<()> {
        self.record(MockCall::Start { id: self.id });
        self.respond(&self.start_result).await
    }

    async fn container_stop(&self) -> Result<()> {
        self.record(MockCall::Stop { id: self.id });
        self.respond(&self.stop_result).await
    }

    async fn remove_all_by_name_contains(&self, pattern: &str) -> Result<()> {
        self.record(MockCall::RemoveAllByNameContains {
            id: self.id,
            pattern: pattern.to_string(),
        });
        self.respond(&self.remove_by_name_result).await
    }

    async fn image_remove(&self) -> Result<()> {
        self.record(MockCall::ImageRemove { id: self.id });
        self.respond(&self.image_remove_result).await
    }

    async fn remove_container(&self) -> Result<()> {
        self.record(MockCall::RemoveContainer { id: self.id });
        self.respond(&self.remove_container_result).await
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
        self.inspect.lock().unwrap().clone()
    }

    fn last_logs(&self) -> String {
        self.logs.lock().unwrap().clone()
    }
}

/// Configurable mock network controller
pub struct MockNetwork {
    pub calls: CallLog,
    pub create_result: Arc<Mutex<Result<()>>>,
    pub remove_result: Arc<Mutex<Result<()>>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::with_log(call_log())
    }

    pub fn with_log(calls: CallLog) -> Self {
        Self {
            calls,
            create_result: ok(),
            remove_result: ok(),
        }
    }
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkController for MockNetwork {
    async fn network_create(&self, name: &str, cidr: &str, gateway: &str) -> Result<()> {
        self.calls.lock().unwrap().push(MockCall::NetworkCreate {
            name: name.to_string(),
            cidr: cidr.to_string(),
            gateway: gateway.to_string(),
        });
        clone_result(&self.create_result)
    }

    async fn remove(&self) -> Result<()> {
        self.calls.lock().unwrap().push(MockCall::NetworkRemove);
        clone_result(&self.remove_result)
    }
}

/// View sink that records everything it is asked to show
pub struct RecordingSink {
    pub statuses: Arc<Mutex<Vec<(ResourceId, String)>>>,
    pub inspects: Arc<Mutex<Vec<(ResourceId, String, String)>>>,
    pub modals: Arc<Mutex<Vec<String>>>,
    /// Answer given to every error modal
    pub modal_choice: Arc<Mutex<ModalChoice>>,
    /// When set, publishes fail with [`ViewError::Stale`]
    pub stale: Arc<AtomicBool>,
    modal_shown: Notify,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(Mutex::new(Vec::new())),
            inspects: Arc::new(Mutex::new(Vec::new())),
            modals: Arc::new(Mutex::new(Vec::new())),
            modal_choice: Arc::new(Mutex::new(ModalChoice::Return)),
            stale: Arc::new(AtomicBool::new(false)),
            modal_shown: Notify::new(),
        }
    }

    pub fn statuses_for(&self, id: ResourceId) -> Vec<String> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|(rid, _)| *rid == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn modal_messages(&self) -> Vec<String> {
        self.modals.lock().unwrap().clone()
    }

    /// Wait until at least `count` modals have been shown
    pub async fn wait_for_modals(&self, count: usize) -> Vec<String> {
        loop {
            let modals = self.modal_messages();
            if modals.len() >= count {
                return modals;
            }
            self.modal_shown.notified().await;
        }
    }

    fn check_stale(&self) -> std::result::Result<(), ViewError> {
        if self.stale.load(Ordering::SeqCst) {
            Err(ViewError::Stale("recording sink closed".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ViewSink for RecordingSink {
    fn publish_status(&self, id: ResourceId, text: &str) -> std::result::Result<(), ViewError> {
        self.check_stale()?;
        self.statuses.lock().unwrap().push((id, text.to_string()));
        Ok(())
    }

    fn publish_inspect(
        &self,
        id: ResourceId,
        summary: &str,
        logs: &str,
    ) -> std::result::Result<(), ViewError> {
        self.check_stale()?;
        self.inspects
            .lock()
            .unwrap()
            .push((id, summary.to_string(), logs.to_string()));
        Ok(())
    }

    async fn show_error_modal(&self, message: &str) -> ModalChoice {
        self.modals.lock().unwrap().push(message.to_string());
        self.modal_shown.notify_one();
        *self.modal_choice.lock().unwrap()
    }
}
