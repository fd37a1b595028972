//! Wiring of controllers, aggregators and the dispatcher

use crate::{
    command_channel, CommandDispatcher, CommandSender, CoreError, DispatchSettings, Result,
    StatusAggregator, StatusHandle, ViewSink,
};
use dockwatch_config::GlobalConfig;
use dockwatch_provider::{NetworkController, ResourceController, ResourceId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running set of aggregation loops plus the command dispatcher
pub struct Session {
    handles: Vec<StatusHandle>,
    commands: CommandSender,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    /// Initialize both controllers and spawn one aggregator per resource
    pub async fn start(
        nats: Arc<dyn ResourceController>,
        project: Arc<dyn ResourceController>,
        network: Arc<dyn NetworkController>,
        sink: Arc<dyn ViewSink>,
        config: &GlobalConfig,
        cancel: CancellationToken,
    ) -> Result<Self> {
        expect_id(nats.as_ref(), ResourceId::Nats)?;
        expect_id(project.as_ref(), ResourceId::Project)?;

        nats.init().await?;
        project.init().await?;

        let tick = config.ui.tick();
        let nats_status =
            StatusAggregator::new(Arc::clone(&nats), Arc::clone(&sink), tick, cancel.clone())?;
        let project_status =
            StatusAggregator::new(Arc::clone(&project), Arc::clone(&sink), tick, cancel.clone())?;

        let handles = vec![nats_status.handle(), project_status.handle()];
        let notes = vec![nats_status.note_sender(), project_status.note_sender()];

        let (commands, receiver) = command_channel();
        let dispatcher = CommandDispatcher::new(
            nats,
            project,
            network,
            notes,
            sink,
            DispatchSettings::from_config(config),
            cancel.clone(),
        );

        let tasks = vec![
            nats_status.spawn(),
            project_status.spawn(),
            tokio::spawn(dispatcher.run(receiver)),
        ];
        tracing::info!("session started");

        Ok(Self {
            handles,
            commands,
            cancel,
            tasks,
        })
    }

    pub fn handle(&self, id: ResourceId) -> Option<StatusHandle> {
        self.handles.iter().find(|h| h.id() == id).cloned()
    }

    pub fn handles(&self) -> &[StatusHandle] {
        &self.handles
    }

    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every loop and wait for them to return
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!("session task ended abnormally: {}", e);
            }
        }
        tracing::info!("session stopped");
    }
}

fn expect_id(controller: &dyn ResourceController, expected: ResourceId) -> Result<()> {
    if controller.id() == expected {
        Ok(())
    } else {
        Err(CoreError::Configuration(format!(
            "expected a {} controller, got {}",
            expected,
            controller.id()
        )))
    }
}
