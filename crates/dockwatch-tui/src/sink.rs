//! View sink that forwards aggregator output to the render loop

use async_trait::async_trait;
use dockwatch_core::{ModalChoice, ViewError, ViewSink};
use dockwatch_provider::ResourceId;
use tokio::sync::{mpsc, oneshot};

/// Redraw requests consumed by [`crate::App`]
#[derive(Debug)]
pub enum UiMessage {
    Status {
        id: ResourceId,
        text: String,
    },
    Inspect {
        id: ResourceId,
        summary: String,
        logs: String,
    },
    ErrorModal {
        message: String,
        reply: oneshot::Sender<ModalChoice>,
    },
}

/// [`ViewSink`] backed by an unbounded channel into the render loop
#[derive(Debug, Clone)]
pub struct TuiSink {
    tx: mpsc::UnboundedSender<UiMessage>,
}

impl TuiSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, message: UiMessage) -> Result<(), ViewError> {
        self.tx
            .send(message)
            .map_err(|_| ViewError::Stale("render loop has stopped".to_string()))
    }
}

#[async_trait]
impl ViewSink for TuiSink {
    fn publish_status(&self, id: ResourceId, text: &str) -> Result<(), ViewError> {
        self.send(UiMessage::Status {
            id,
            text: text.to_string(),
        })
    }

    fn publish_inspect(&self, id: ResourceId, summary: &str, logs: &str) -> Result<(), ViewError> {
        self.send(UiMessage::Inspect {
            id,
            summary: summary.to_string(),
            logs: logs.to_string(),
        })
    }

    async fn show_error_modal(&self, message: &str) -> ModalChoice {
        let (reply, answer) = oneshot::channel();
        let request = UiMessage::ErrorModal {
            message: message.to_string(),
            reply,
        };
        if self.send(request).is_err() {
            tracing::warn!("error not shown, render loop has stopped: {}", message);
            return ModalChoice::Quit;
        }
        // A dropped reply means the app closed with the dialog open
        answer.await.unwrap_or(ModalChoice::Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_receiver() {
        let (sink, mut rx) = TuiSink::channel();
        sink.publish_status(ResourceId::Nats, "Installation state: Stopped")
            .unwrap();

        match rx.recv().await {
            Some(UiMessage::Status { id, text }) => {
                assert_eq!(id, ResourceId::Nats);
                assert!(text.ends_with("Stopped"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_closed_loop_is_stale() {
        let (sink, rx) = TuiSink::channel();
        drop(rx);
        assert!(matches!(
            sink.publish_inspect(ResourceId::Project, "", ""),
            Err(ViewError::Stale(_))
        ));
        assert_eq!(sink.show_error_modal("boom").await, ModalChoice::Quit);
    }

    #[tokio::test]
    async fn test_modal_answer_is_returned() {
        let (sink, mut rx) = TuiSink::channel();
        let answer = tokio::spawn(async move { sink.show_error_modal("boom").await });

        match rx.recv().await {
            Some(UiMessage::ErrorModal { message, reply }) => {
                assert_eq!(message, "boom");
                reply.send(ModalChoice::Return).unwrap();
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(answer.await.unwrap(), ModalChoice::Return);
    }
}
