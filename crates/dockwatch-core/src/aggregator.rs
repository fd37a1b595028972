//! Per-resource status aggregation loop

use crate::{CoreError, ResourceStatus, Result, StatusHandle, StatusInput, ViewSink};
use dockwatch_provider::{ProgressEvent, ResourceController, ResourceId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Sends status notes into one resource's aggregation loop
#[derive(Debug, Clone)]
pub struct NoteSender {
    id: ResourceId,
    tx: mpsc::UnboundedSender<String>,
}

impl NoteSender {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn send(&self, note: impl Into<String>) {
        if self.tx.send(note.into()).is_err() {
            tracing::warn!(resource = %self.id, "status note dropped: aggregator stopped");
        }
    }
}

/// Consolidates one resource's notification channels and a periodic tick
/// into its [`ResourceStatus`].
///
/// The loop is the only writer of the status. Each iteration takes exactly
/// one input, applies it, and publishes one snapshot.
pub struct StatusAggregator {
    id: ResourceId,
    controller: Arc<dyn ResourceController>,
    sink: Arc<dyn ViewSink>,
    tick: Duration,
    cancel: CancellationToken,
    ready_rx: mpsc::Receiver<()>,
    events_rx: mpsc::Receiver<ProgressEvent>,
    inspect_rx: mpsc::Receiver<()>,
    notes_tx: mpsc::UnboundedSender<String>,
    notes_rx: mpsc::UnboundedReceiver<String>,
    status: ResourceStatus,
    publisher: watch::Sender<ResourceStatus>,
}

impl StatusAggregator {
    /// Take the controller's notification channels.
    ///
    /// Fails if any channel was already taken or the tick is zero.
    pub fn new(
        controller: Arc<dyn ResourceController>,
        sink: Arc<dyn ViewSink>,
        tick: Duration,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let id = controller.id();
        if tick.is_zero() {
            return Err(CoreError::Configuration(format!(
                "{}: tick interval must be greater than zero",
                id
            )));
        }

        let ready_rx = controller
            .take_ready_channel()
            .ok_or_else(|| missing_channel(id, "container-ready"))?;
        let events_rx = controller
            .take_event_channel()
            .ok_or_else(|| missing_channel(id, "progress event"))?;
        let inspect_rx = controller
            .take_inspect_channel()
            .ok_or_else(|| missing_channel(id, "inspect"))?;

        let (notes_tx, notes_rx) = mpsc::unbounded_channel();
        let status = ResourceStatus::new();
        let (publisher, _) = watch::channel(status.clone());

        Ok(Self {
            id,
            controller,
            sink,
            tick,
            cancel,
            ready_rx,
            events_rx,
            inspect_rx,
            notes_tx,
            notes_rx,
            status,
            publisher,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Read-only handle to the published status
    pub fn handle(&self) -> StatusHandle {
        StatusHandle::new(self.id, self.publisher.subscribe())
    }

    pub fn note_sender(&self) -> NoteSender {
        NoteSender {
            id: self.id,
            tx: self.notes_tx.clone(),
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until cancelled or a notification channel closes
    pub async fn run(mut self) {
        tracing::debug!(resource = %self.id, "status aggregator started");
        self.publish(false);

        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let input = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!(resource = %self.id, "status aggregator cancelled");
                    break;
                }
                _ = ticker.tick() => StatusInput::Tick,
                ready = self.ready_rx.recv() => match ready {
                    Some(()) => StatusInput::ContainerReady,
                    None => {
                        self.channel_closed("container-ready");
                        break;
                    }
                },
                event = self.events_rx.recv() => match event {
                    Some(event) => StatusInput::Progress(event),
                    None => {
                        self.channel_closed("progress event");
                        break;
                    }
                },
                inspect = self.inspect_rx.recv() => match inspect {
                    Some(()) => StatusInput::Inspect {
                        summary: self.controller.last_inspect(),
                        logs: self.controller.last_logs(),
                    },
                    None => {
                        self.channel_closed("inspect");
                        break;
                    }
                },
                Some(note) = self.notes_rx.recv() => StatusInput::Note(note),
            };

            let inspected = matches!(input, StatusInput::Inspect { .. });
            self.status.apply(input);
            self.publish(inspected);
        }
    }

    fn publish(&self, inspected: bool) {
        self.publisher.send_replace(self.status.clone());

        if let Err(e) = self.sink.publish_status(self.id, &self.status.render()) {
            tracing::warn!(resource = %self.id, "status update not shown: {}", e);
        }
        if inspected {
            if let Err(e) = self.sink.publish_inspect(
                self.id,
                &self.status.inspect_summary,
                &self.status.log_tail,
            ) {
                tracing::warn!(resource = %self.id, "inspect update not shown: {}", e);
            }
        }
    }

    fn channel_closed(&self, channel: &str) {
        tracing::error!(
            resource = %self.id,
            "{} channel closed, shutting down",
            channel
        );
        self.cancel.cancel();
    }
}

fn missing_channel(id: ResourceId, channel: &str) -> CoreError {
    CoreError::Configuration(format!("{}: {} channel is not available", id, channel))
}
