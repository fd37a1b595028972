//! Per-resource status record

use crate::render::{render_inspect, render_status};
use dockwatch_provider::{InspectSummary, ProgressEvent, ResourceId};
use tokio::sync::watch;

pub const STATUS_STOPPED: &str = "Stopped";
pub const STATUS_READY: &str = "Container ready for use";
pub const STATUS_IMAGE_BUILT: &str = "Image build complete";
pub const STATUS_CONTAINER_BUILT: &str = "Container build complete";
pub const STATUS_STARTING: &str = "Starting container";

/// View state of one tracked resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceStatus {
    pub status_text: String,
    pub download_percent: f64,
    pub extract_percent: f64,
    /// Formatted inspect block
    pub inspect_summary: String,
    pub log_tail: String,
}

impl Default for ResourceStatus {
    fn default() -> Self {
        Self {
            status_text: STATUS_STOPPED.to_string(),
            download_percent: 0.0,
            extract_percent: 0.0,
            inspect_summary: String::new(),
            log_tail: String::new(),
        }
    }
}

/// One input consumed by an aggregation loop
#[derive(Debug, Clone, PartialEq)]
pub enum StatusInput {
    /// Periodic heartbeat
    Tick,
    ContainerReady,
    Progress(ProgressEvent),
    Inspect {
        summary: InspectSummary,
        logs: String,
    },
    /// Free-text status line from the command dispatcher
    Note(String),
}

impl ResourceStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one input into the record
    pub fn apply(&mut self, input: StatusInput) {
        match input {
            StatusInput::Tick => {
                self.download_percent = 0.0;
                self.extract_percent = 0.0;
            }
            StatusInput::ContainerReady => {
                self.status_text = STATUS_READY.to_string();
                self.download_percent = 100.0;
                self.extract_percent = 100.0;
            }
            StatusInput::Progress(event) => self.apply_progress(&event),
            StatusInput::Inspect { summary, logs } => {
                self.inspect_summary = render_inspect(&summary);
                self.log_tail = logs;
            }
            StatusInput::Note(note) => self.status_text = note,
        }
    }

    // Field order matters: a percentage reported alongside `closed`
    // overrides the 100 that `closed` sets.
    fn apply_progress(&mut self, event: &ProgressEvent) {
        if event.image_built {
            self.status_text = STATUS_IMAGE_BUILT.to_string();
        }
        if event.container_built {
            self.status_text = STATUS_CONTAINER_BUILT.to_string();
        }
        if event.closed {
            self.status_text = STATUS_STARTING.to_string();
            self.download_percent = 100.0;
            self.extract_percent = 100.0;
        }
        if let Some(percent) = reported(event.downloading) {
            self.download_percent = percent;
        }
        if let Some(percent) = reported(event.extracting) {
            self.extract_percent = percent;
        }
    }

    /// The three-line status block
    pub fn render(&self) -> String {
        render_status(&self.status_text, self.download_percent, self.extract_percent)
    }
}

/// Zero, negative and NaN values count as not reported
fn reported(value: f64) -> Option<f64> {
    (value > 0.0).then(|| value.min(100.0))
}

/// Read-only view of a resource's latest status
#[derive(Debug, Clone)]
pub struct StatusHandle {
    id: ResourceId,
    rx: watch::Receiver<ResourceStatus>,
}

impl StatusHandle {
    pub(crate) fn new(id: ResourceId, rx: watch::Receiver<ResourceStatus>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Clone of the most recently published status
    pub fn snapshot(&self) -> ResourceStatus {
        self.rx.borrow().clone()
    }

    /// Wait for the next publish. Returns false once the aggregator is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Wait until a published status satisfies `predicate`
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&ResourceStatus) -> bool,
    ) -> Option<ResourceStatus> {
        self.rx
            .wait_for(|status| predicate(status))
            .await
            .ok()
            .map(|status| status.clone())
    }
}
