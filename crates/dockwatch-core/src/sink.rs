//! Interface to the passive renderer

use async_trait::async_trait;
use dockwatch_provider::ResourceId;
use thiserror::Error;

/// A publish the view could not take
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("view is not accepting updates: {0}")]
    Stale(String),
}

/// Answer to the error modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalChoice {
    Return,
    Quit,
}

/// Receives rendered text and shows error modals.
///
/// `publish_*` must not block: aggregation loops call them on every input.
#[async_trait]
pub trait ViewSink: Send + Sync {
    fn publish_status(&self, id: ResourceId, text: &str) -> Result<(), ViewError>;

    fn publish_inspect(&self, id: ResourceId, summary: &str, logs: &str) -> Result<(), ViewError>;

    /// Show `message` and wait for the user's choice
    async fn show_error_modal(&self, message: &str) -> ModalChoice;
}
