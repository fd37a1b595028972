//! Menu commands to controller calls

use crate::{CoreError, ModalChoice, NoteSender, Result, ViewSink};
use dockwatch_config::{GlobalConfig, NetworkConfig, ProjectConfig};
use dockwatch_provider::{NetworkController, ResourceController, ResourceId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A user command from the menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    InstallNats,
    StopNats,
    StartNats,
    RemoveNatsContainers,
    RemoveNatsImage,
    BuildProject,
}

impl Command {
    pub fn all() -> &'static [Command] {
        &[
            Command::InstallNats,
            Command::StopNats,
            Command::StartNats,
            Command::RemoveNatsContainers,
            Command::RemoveNatsImage,
            Command::BuildProject,
        ]
    }

    /// The resource whose status reflects this command
    pub fn target(&self) -> ResourceId {
        match self {
            Command::BuildProject => ResourceId::Project,
            _ => ResourceId::Nats,
        }
    }

    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            Command::InstallNats => "Install NATS",
            Command::StopNats => "Stop NATS",
            Command::StartNats => "Start NATS",
            Command::RemoveNatsContainers => "Remove NATS containers",
            Command::RemoveNatsImage => "Remove NATS image",
            Command::BuildProject => "Build project",
        }
    }

    /// Status line shown as soon as the command is accepted
    pub fn status_note(&self) -> &'static str {
        match self {
            Command::InstallNats => "Installing",
            Command::StopNats => "Stop command sent",
            Command::StartNats => "Start command sent",
            Command::RemoveNatsContainers | Command::RemoveNatsImage => "Remove command sent",
            Command::BuildProject => "Building",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Steps of [`Command::InstallNats`], in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    RemoveProjectContainer,
    RemoveStaleContainers,
    RecreateNetwork,
    Install,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallStep::RemoveProjectContainer => write!(f, "removing project container"),
            InstallStep::RemoveStaleContainers => write!(f, "removing stale containers"),
            InstallStep::RecreateNetwork => write!(f, "creating network"),
            InstallStep::Install => write!(f, "installing NATS"),
        }
    }
}

/// Steps of [`Command::BuildProject`], in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    BuildImage,
    Install,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::BuildImage => write!(f, "building project image"),
            BuildStep::Install => write!(f, "installing project"),
        }
    }
}

/// Fire-and-forget command queue used by the UI
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    /// Queue a command. Returns false once the dispatcher has stopped.
    pub fn send(&self, command: Command) -> bool {
        match self.tx.send(command) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!("command {:?} dropped: dispatcher stopped", command);
                false
            }
        }
    }
}

pub type CommandReceiver = mpsc::UnboundedReceiver<Command>;

pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, rx)
}

/// Names and paths the composite commands use
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub stale_name_filter: String,
    pub network: NetworkConfig,
    pub project: ProjectConfig,
}

impl DispatchSettings {
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            stale_name_filter: config.nats.stale_name_filter.clone(),
            network: config.network.clone(),
            project: config.project.clone(),
        }
    }
}

/// Controllers a command may touch; cloned into each command task
#[derive(Clone)]
struct Targets {
    nats: Arc<dyn ResourceController>,
    project: Arc<dyn ResourceController>,
    network: Arc<dyn NetworkController>,
    settings: Arc<DispatchSettings>,
}

impl Targets {
    async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::InstallNats => self.install_nats().await,
            Command::StopNats => self
                .nats
                .container_stop()
                .await
                .map_err(|e| CoreError::operation("stopping NATS", e)),
            Command::StartNats => self
                .nats
                .container_start()
                .await
                .map_err(|e| CoreError::operation("starting NATS", e)),
            Command::RemoveNatsContainers => self
                .nats
                .remove_all_by_name_contains(&self.settings.stale_name_filter)
                .await
                .map_err(|e| CoreError::operation("removing NATS containers", e)),
            Command::RemoveNatsImage => self
                .nats
                .image_remove()
                .await
                .map_err(|e| CoreError::operation("removing NATS image", e)),
            Command::BuildProject => self.build_project().await,
        }
    }

    async fn install_nats(&self) -> Result<()> {
        let network = &self.settings.network;

        self.project
            .remove_container()
            .await
            .map_err(|e| CoreError::operation(InstallStep::RemoveProjectContainer, e))?;

        self.nats
            .remove_all_by_name_contains(&self.settings.stale_name_filter)
            .await
            .map_err(|e| CoreError::operation(InstallStep::RemoveStaleContainers, e))?;

        self.network
            .remove()
            .await
            .map_err(|e| CoreError::operation(InstallStep::RecreateNetwork, e))?;
        self.network
            .network_create(&network.name, &network.cidr, &network.gateway)
            .await
            .map_err(|e| CoreError::operation(InstallStep::RecreateNetwork, e))?;

        self.nats
            .install()
            .await
            .map_err(|e| CoreError::operation(InstallStep::Install, e))
    }

    async fn build_project(&self) -> Result<()> {
        let project = &self.settings.project;

        self.project
            .build(&project.source_path, &project.image_tag, &project.container_name)
            .await
            .map_err(|e| CoreError::operation(BuildStep::BuildImage, e))?;

        self.project
            .install()
            .await
            .map_err(|e| CoreError::operation(BuildStep::Install, e))
    }
}

/// Runs user commands off the UI path and reports failures to the view
pub struct CommandDispatcher {
    targets: Targets,
    notes: HashMap<ResourceId, NoteSender>,
    sink: Arc<dyn ViewSink>,
    cancel: CancellationToken,
}

impl CommandDispatcher {
    pub fn new(
        nats: Arc<dyn ResourceController>,
        project: Arc<dyn ResourceController>,
        network: Arc<dyn NetworkController>,
        notes: Vec<NoteSender>,
        sink: Arc<dyn ViewSink>,
        settings: DispatchSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            targets: Targets {
                nats,
                project,
                network,
                settings: Arc::new(settings),
            },
            notes: notes.into_iter().map(|n| (n.id(), n)).collect(),
            sink,
            cancel,
        }
    }

    /// Run one command to completion on the current task
    pub async fn execute(&self, command: Command) -> Result<()> {
        self.targets.execute(command).await
    }

    /// Consume commands until cancelled or every sender is dropped.
    ///
    /// Commands still running when the loop stops are aborted.
    pub async fn run(self, mut commands: CommandReceiver) {
        let mut running: JoinSet<(Command, Result<()>)> = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.start(command, &mut running),
                    None => {
                        tracing::debug!("command channel closed");
                        break;
                    }
                },
                Some(joined) = running.join_next() => match joined {
                    Ok((command, outcome)) => self.finish(command, outcome),
                    Err(e) => tracing::error!("command task failed: {}", e),
                },
            }
        }

        if !running.is_empty() {
            tracing::info!("aborting {} running command(s)", running.len());
        }
        running.shutdown().await;
    }

    fn start(&self, command: Command, running: &mut JoinSet<(Command, Result<()>)>) {
        tracing::info!("running command: {}", command);
        self.note(command.target(), command.status_note());

        let targets = self.targets.clone();
        running.spawn(async move { (command, targets.execute(command).await) });
    }

    fn finish(&self, command: Command, outcome: Result<()>) {
        let err = match outcome {
            Ok(()) => {
                tracing::info!("command finished: {}", command);
                return;
            }
            Err(e) => e,
        };

        tracing::error!("command {} failed: {}", command, err);
        let note = match err.step() {
            Some(step) => format!("Error {}", step),
            None => format!("Error: {}", command),
        };
        self.note(command.target(), note);

        let sink = Arc::clone(&self.sink);
        let cancel = self.cancel.clone();
        let message = err.to_string();
        tokio::spawn(async move {
            if sink.show_error_modal(&message).await == ModalChoice::Quit {
                tracing::info!("quit chosen from error dialog");
                cancel.cancel();
            }
        });
    }

    fn note(&self, id: ResourceId, note: impl Into<String>) {
        match self.notes.get(&id) {
            Some(sender) => sender.send(note),
            None => tracing::debug!(resource = %id, "no aggregator for status note"),
        }
    }
}
