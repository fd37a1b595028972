//! Rendering tests against ratatui's TestBackend

mod helpers;

use dockwatch_core::{render_inspect, render_status};
use dockwatch_provider::{InspectSummary, PortMapping, ResourceId};
use dockwatch_tui::{App, ErrorModal, Page, UiMessage};
use helpers::render_app;

#[test]
fn test_main_page_shows_menu_and_default_status() {
    let mut app = App::new_for_testing();
    let output = render_app(&mut app, 100, 30);

    assert!(output.contains("dockwatch - Container Status"));
    assert!(output.contains(" Actions "));
    assert!(output.contains("Install NATS"));
    assert!(output.contains("Remove NATS image"));
    assert!(output.contains("Build project"));
    assert!(output.contains(" NATS "));
    assert!(output.contains(" Project "));
    assert!(output.contains("Installation state: Stopped"));
    assert!(output.contains("Image download:     0.0%"));
}

#[test]
fn test_resource_page_shows_status_inspect_and_logs() {
    let mut app = App::new_for_testing();
    app.page = Page::Resource(ResourceId::Nats);
    app.handle_ui_message(UiMessage::Status {
        id: ResourceId::Nats,
        text: render_status("Ready", 100.0, 100.0),
    });
    let summary = InspectSummary {
        state: "running".to_string(),
        ports: vec![PortMapping::new(4222, "tcp", Some(4222))],
        gateway: "12.0.0.1".to_string(),
        ip_address: "12.0.0.2".to_string(),
        mac_address: "02:42:0c:00:00:02".to_string(),
    };
    app.handle_ui_message(UiMessage::Inspect {
        id: ResourceId::Nats,
        summary: render_inspect(&summary),
        logs: "\u{1b}[32m[INF]\u{1b}[0m Server is ready\n".to_string(),
    });

    let output = render_app(&mut app, 100, 30);
    assert!(output.contains("Installation state: Ready"));
    assert!(output.contains("Image extraction:   100.0%"));
    assert!(output.contains("4222/tcp:4222/tcp"));
    assert!(output.contains("12.0.0.2"));
    assert!(output.contains("[INF] Server is ready"));
    assert!(!output.contains("\u{1b}"));
    assert!(output.contains("updated"));
}

#[test]
fn test_resource_page_without_container() {
    let mut app = App::new_for_testing();
    app.page = Page::Resource(ResourceId::Project);
    let output = render_app(&mut app, 100, 30);

    assert!(output.contains("No container information yet"));
    assert!(output.contains(" Download "));
    assert!(output.contains(" Extraction "));
}

#[test]
fn test_error_modal_is_drawn_over_page() {
    let mut app = App::new_for_testing();
    app.push_modal(ErrorModal::new(
        "installing NATS failed: Image not found: nats:latest",
        None,
    ));
    app.push_modal(ErrorModal::new("second", None));

    let output = render_app(&mut app, 100, 30);
    assert!(output.contains(" Error "));
    assert!(output.contains("Image not found: nats:latest"));
    assert!(output.contains("Return"));
    assert!(output.contains("Quit"));
    assert!(output.contains("more errors waiting"));
}

#[test]
fn test_main_page_snapshot() {
    let mut app = App::new_for_testing();
    let output = render_app(&mut app, 80, 24);
    insta::assert_snapshot!("main_page", output);
}

#[test]
fn test_resource_page_snapshot() {
    let mut app = App::new_for_testing();
    app.page = Page::Resource(ResourceId::Nats);
    // Fields set directly so the title carries no timestamp
    let panel = app.panels.entry(ResourceId::Nats).or_default();
    panel.status = render_status("Container ready for use", 0.0, 0.0);
    panel.inspect = render_inspect(&InspectSummary {
        state: "running".to_string(),
        ports: vec![
            PortMapping::new(8222, "tcp", Some(8222)),
            PortMapping::new(4222, "tcp", Some(4222)),
        ],
        gateway: "12.0.0.1".to_string(),
        ip_address: "12.0.0.2".to_string(),
        mac_address: "02:42:0c:00:00:02".to_string(),
    });
    panel.logs = "nats started\n[INF] Server is ready\n".to_string();

    let output = render_app(&mut app, 80, 24);
    insta::assert_snapshot!("resource_page", output);
}

#[test]
fn test_error_modal_snapshot() {
    let mut app = App::new_for_testing();
    app.push_modal(ErrorModal::new(
        "installing NATS failed: Image not found: nats:latest",
        None,
    ));

    let output = render_app(&mut app, 80, 24);
    insta::assert_snapshot!("error_modal", output);
}
