//! Command dispatch against mock controllers

use dockwatch_config::GlobalConfig;
use dockwatch_core::test_support::{call_log, MockCall, MockController, MockNetwork, RecordingSink};
use dockwatch_core::*;
use dockwatch_provider::{NetworkController, ProviderError, ResourceController, ResourceId};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

struct Fixture {
    nats: Arc<MockController>,
    project: Arc<MockController>,
    network: Arc<MockNetwork>,
    sink: Arc<RecordingSink>,
}

impl Fixture {
    fn new() -> Self {
        let log = call_log();
        Self {
            nats: Arc::new(MockController::with_log(ResourceId::Nats, log.clone())),
            project: Arc::new(MockController::with_log(ResourceId::Project, log.clone())),
            network: Arc::new(MockNetwork::with_log(log.clone())),
            sink: Arc::new(RecordingSink::new()),
        }
    }

    fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(
            self.nats.clone() as Arc<dyn ResourceController>,
            self.project.clone() as Arc<dyn ResourceController>,
            self.network.clone() as Arc<dyn NetworkController>,
            Vec::new(),
            self.sink.clone() as Arc<dyn ViewSink>,
            DispatchSettings::from_config(&GlobalConfig::default()),
            CancellationToken::new(),
        )
    }

    async fn session(&self, cancel: CancellationToken) -> Session {
        Session::start(
            self.nats.clone(),
            self.project.clone(),
            self.network.clone(),
            self.sink.clone(),
            &GlobalConfig::default(),
            cancel,
        )
        .await
        .unwrap()
    }

    fn calls(&self) -> Vec<MockCall> {
        // Every mock in the fixture records into the same log
        self.nats.get_calls()
    }
}

#[tokio::test]
async fn test_install_nats_runs_steps_in_order() {
    let f = Fixture::new();
    f.dispatcher().execute(Command::InstallNats).await.unwrap();

    assert_eq!(
        f.calls(),
        vec![
            MockCall::RemoveContainer {
                id: ResourceId::Project
            },
            MockCall::RemoveAllByNameContains {
                id: ResourceId::Nats,
                pattern: "nats_delete".to_string()
            },
            MockCall::NetworkRemove,
            MockCall::NetworkCreate {
                name: "cache_delete_after_test".to_string(),
                cidr: "12.0.0.0/16".to_string(),
                gateway: "12.0.0.1".to_string()
            },
            MockCall::Install {
                id: ResourceId::Nats
            },
        ]
    );
}

#[tokio::test]
async fn test_install_stops_when_network_creation_fails() {
    let f = Fixture::new();
    *f.network.create_result.lock().unwrap() =
        Err(ProviderError::NetworkError("subnet overlaps".into()));

    let err = f.dispatcher().execute(Command::InstallNats).await.unwrap_err();
    assert_eq!(err.step(), Some("creating network"));
    assert!(err.to_string().contains("subnet overlaps"));
    assert!(!f.nats.was_called(&MockCall::Install {
        id: ResourceId::Nats
    }));
}

#[tokio::test]
async fn test_install_stops_when_stale_removal_fails() {
    let f = Fixture::new();
    *f.nats.remove_by_name_result.lock().unwrap() =
        Err(ProviderError::RuntimeError("daemon busy".into()));

    let err = f.dispatcher().execute(Command::InstallNats).await.unwrap_err();
    assert_eq!(err.step(), Some("removing stale containers"));
    assert!(!f.calls().contains(&MockCall::NetworkRemove));
    assert!(!f.calls().iter().any(|c| matches!(c, MockCall::NetworkCreate { .. })));
}

#[tokio::test]
async fn test_install_stops_when_project_removal_fails() {
    let f = Fixture::new();
    *f.project.remove_container_result.lock().unwrap() =
        Err(ProviderError::RuntimeError("removal in progress".into()));

    let err = f.dispatcher().execute(Command::InstallNats).await.unwrap_err();
    assert_eq!(err.step(), Some("removing project container"));
    assert_eq!(
        f.calls(),
        vec![MockCall::RemoveContainer {
            id: ResourceId::Project
        }]
    );
}

#[tokio::test]
async fn test_install_stops_when_network_removal_fails() {
    let f = Fixture::new();
    *f.network.remove_result.lock().unwrap() =
        Err(ProviderError::NetworkError("network has active endpoints".into()));

    let err = f.dispatcher().execute(Command::InstallNats).await.unwrap_err();
    assert_eq!(err.step(), Some("creating network"));
    assert_eq!(f.calls().last(), Some(&MockCall::NetworkRemove));
    assert!(!f.calls().iter().any(|c| matches!(c, MockCall::NetworkCreate { .. })));
    assert!(!f.nats.was_called(&MockCall::Install {
        id: ResourceId::Nats
    }));
}

#[tokio::test]
async fn test_build_project_builds_then_installs() {
    let f = Fixture::new();
    f.dispatcher().execute(Command::BuildProject).await.unwrap();

    assert_eq!(
        f.calls(),
        vec![
            MockCall::Build {
                id: ResourceId::Project,
                source: PathBuf::from("./projectUnderTest/queue"),
                tag: "image_delete_queue_test:latest".to_string(),
                name: "container_delete_queue_1_test".to_string(),
            },
            MockCall::Install {
                id: ResourceId::Project
            },
        ]
    );
}

#[tokio::test]
async fn test_failed_build_skips_install() {
    let f = Fixture::new();
    *f.project.build_result.lock().unwrap() = Err(ProviderError::BuildError("no Dockerfile".into()));

    let err = f.dispatcher().execute(Command::BuildProject).await.unwrap_err();
    assert_eq!(err.step(), Some("building project image"));
    assert!(!f.project.was_called(&MockCall::Install {
        id: ResourceId::Project
    }));
}

#[tokio::test]
async fn test_single_commands_reach_nats() {
    let f = Fixture::new();
    let dispatcher = f.dispatcher();
    dispatcher.execute(Command::StopNats).await.unwrap();
    dispatcher.execute(Command::StartNats).await.unwrap();
    dispatcher.execute(Command::RemoveNatsImage).await.unwrap();
    dispatcher.execute(Command::RemoveNatsContainers).await.unwrap();

    assert_eq!(
        f.calls(),
        vec![
            MockCall::Stop {
                id: ResourceId::Nats
            },
            MockCall::Start {
                id: ResourceId::Nats
            },
            MockCall::ImageRemove {
                id: ResourceId::Nats
            },
            MockCall::RemoveAllByNameContains {
                id: ResourceId::Nats,
                pattern: "nats_delete".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_session_failure_reaches_modal_and_status() {
    let f = Fixture::new();
    *f.nats.stop_result.lock().unwrap() =
        Err(ProviderError::ContainerNotFound("container_nats_delete_after_test".into()));

    let session = f.session(CancellationToken::new()).await;
    let mut nats = session.handle(ResourceId::Nats).unwrap();
    assert!(session.commands().send(Command::StopNats));

    let modals = tokio::time::timeout(WAIT, f.sink.wait_for_modals(1))
        .await
        .expect("no error modal shown");
    assert!(modals[0].starts_with("stopping NATS failed"));
    assert!(modals[0].contains("container_nats_delete_after_test"));

    let status = tokio::time::timeout(WAIT, nats.wait_for(|s| s.status_text == "Error stopping NATS"))
        .await
        .unwrap();
    assert!(status.is_some());
    assert!(!session.cancel_token().is_cancelled());

    session.shutdown().await;
}

#[tokio::test]
async fn test_quit_from_modal_cancels_process() {
    let f = Fixture::new();
    *f.nats.install_result.lock().unwrap() = Err(ProviderError::ImageNotFound("nats:latest".into()));
    *f.sink.modal_choice.lock().unwrap() = ModalChoice::Quit;

    let cancel = CancellationToken::new();
    let session = f.session(cancel.clone()).await;
    session.commands().send(Command::InstallNats);

    tokio::time::timeout(WAIT, cancel.cancelled())
        .await
        .expect("quit did not cancel the process");
    let modals = f.sink.modal_messages();
    assert_eq!(modals.len(), 1);
    assert!(modals[0].starts_with("installing NATS failed"));

    session.shutdown().await;
}

#[tokio::test]
async fn test_accepted_command_posts_status_note() {
    let f = Fixture::new();
    let session = f.session(CancellationToken::new()).await;
    let mut nats = session.handle(ResourceId::Nats).unwrap();

    session.commands().send(Command::StartNats);
    let status = tokio::time::timeout(WAIT, nats.wait_for(|s| s.status_text == "Start command sent"))
        .await
        .unwrap();
    assert!(status.is_some());

    // Give the command task time to finish; success shows no modal
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(f.sink.modal_messages().is_empty());
    assert!(f.nats.was_called(&MockCall::Start {
        id: ResourceId::Nats
    }));

    session.shutdown().await;
}

#[tokio::test]
async fn test_session_rejects_swapped_controllers() {
    let f = Fixture::new();
    let result = Session::start(
        f.project.clone(),
        f.nats.clone(),
        f.network.clone(),
        f.sink.clone(),
        &GlobalConfig::default(),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(result, Err(CoreError::Configuration(_))));
}

#[tokio::test]
async fn test_session_init_failure_is_reported() {
    let f = Fixture::new();
    *f.nats.init_result.lock().unwrap() =
        Err(ProviderError::ConnectionError("socket missing".into()));

    let result = Session::start(
        f.nats.clone(),
        f.project.clone(),
        f.network.clone(),
        f.sink.clone(),
        &GlobalConfig::default(),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(result, Err(CoreError::Provider(_))));
}

#[tokio::test]
async fn test_session_modal_names_network_step() {
    let f = Fixture::new();
    *f.network.create_result.lock().unwrap() =
        Err(ProviderError::NetworkError("subnet overlaps".into()));

    let session = f.session(CancellationToken::new()).await;
    let mut nats = session.handle(ResourceId::Nats).unwrap();
    session.commands().send(Command::InstallNats);

    let modals = tokio::time::timeout(WAIT, f.sink.wait_for_modals(1))
        .await
        .expect("no error modal shown");
    assert!(modals[0].starts_with("creating network failed"));
    assert!(modals[0].contains("subnet overlaps"));

    let status = tokio::time::timeout(WAIT, nats.wait_for(|s| s.status_text == "Error creating network"))
        .await
        .unwrap();
    assert!(status.is_some());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_aborts_running_command() {
    let f = Fixture::new();
    *f.nats.delay.lock().unwrap() = Duration::from_secs(60);

    let session = f.session(CancellationToken::new()).await;
    session.commands().send(Command::StopNats);
    while !f.nats.was_called(&MockCall::Stop {
        id: ResourceId::Nats
    }) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let finished_before = f.nats.completed.load(Ordering::SeqCst);

    session.shutdown().await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(f.nats.completed.load(Ordering::SeqCst), finished_before);
    assert!(f.sink.modal_messages().is_empty());
}
