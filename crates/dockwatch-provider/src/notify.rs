//! Notification channels a controller hands to the status core
//!
//! Each controller owns one [`ResourceNotifier`] (the sending half, cheap to
//! clone into background tasks) and one [`NotificationSlots`] (the receiving
//! halves, each of which can be taken exactly once).

use crate::ProgressEvent;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Capacity of the progress event channel
pub const EVENT_BUFFER: usize = 64;
/// Capacity of the ready channel
pub const READY_BUFFER: usize = 4;

/// Sending side of a resource's notification channels
#[derive(Debug, Clone)]
pub struct ResourceNotifier {
    ready: mpsc::Sender<()>,
    events: mpsc::Sender<ProgressEvent>,
    inspect: mpsc::Sender<()>,
}

impl ResourceNotifier {
    /// Signal that the container is up
    pub async fn ready(&self) {
        if self.ready.send(()).await.is_err() {
            tracing::debug!("container-ready signal dropped: no listener");
        }
    }

    /// Forward a progress event, waiting for room in the buffer
    pub async fn progress(&self, event: ProgressEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("progress event dropped: no listener");
        }
    }

    /// Signal that a fresh inspect snapshot is available.
    ///
    /// Never blocks: if a signal is already pending the listener will pick up
    /// the newest snapshot anyway.
    pub fn inspect_available(&self) {
        let _ = self.inspect.try_send(());
    }
}

/// Receiving side of a resource's notification channels
#[derive(Debug)]
pub struct NotificationSlots {
    ready: Mutex<Option<mpsc::Receiver<()>>>,
    events: Mutex<Option<mpsc::Receiver<ProgressEvent>>>,
    inspect: Mutex<Option<mpsc::Receiver<()>>>,
}

impl NotificationSlots {
    pub fn take_ready(&self) -> Option<mpsc::Receiver<()>> {
        take(&self.ready)
    }

    pub fn take_events(&self) -> Option<mpsc::Receiver<ProgressEvent>> {
        take(&self.events)
    }

    pub fn take_inspect(&self) -> Option<mpsc::Receiver<()>> {
        take(&self.inspect)
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).take()
}

/// Create a connected notifier/slots pair
pub fn notification_channels() -> (ResourceNotifier, NotificationSlots) {
    let (ready_tx, ready_rx) = mpsc::channel(READY_BUFFER);
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let (inspect_tx, inspect_rx) = mpsc::channel(1);

    (
        ResourceNotifier {
            ready: ready_tx,
            events: events_tx,
            inspect: inspect_tx,
        },
        NotificationSlots {
            ready: Mutex::new(Some(ready_rx)),
            events: Mutex::new(Some(events_rx)),
            inspect: Mutex::new(Some(inspect_rx)),
        },
    )
}
