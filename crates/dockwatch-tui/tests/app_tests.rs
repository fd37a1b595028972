//! Integration tests that exercise App key handling via send_key()

mod helpers;

use crossterm::event::{KeyCode, KeyModifiers};
use dockwatch_core::{command_channel, Command, CommandReceiver, ModalChoice};
use dockwatch_provider::ResourceId;
use dockwatch_tui::{App, ErrorModal, MenuItem, Page, UiMessage};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

fn key(app: &mut App, code: KeyCode) {
    app.send_key(code, KeyModifiers::NONE);
}

fn app_with_queue() -> (App, CommandReceiver, CancellationToken) {
    let (commands, rx) = command_channel();
    let cancel = CancellationToken::new();
    (App::with_commands(commands, cancel.clone()), rx, cancel)
}

// ---------------------------------------------------------------------------
// Menu navigation
// ---------------------------------------------------------------------------

#[test]
fn test_menu_lists_every_command_then_quit() {
    let app = App::new_for_testing();
    let items = app.menu.items();
    assert_eq!(items.len(), Command::all().len() + 1);
    assert_eq!(items[0], MenuItem::Run(Command::InstallNats));
    assert_eq!(items.last(), Some(&MenuItem::Quit));
}

#[test]
fn test_j_and_k_move_the_cursor() {
    let mut app = App::new_for_testing();
    assert_eq!(app.menu.selected_index(), 0);

    key(&mut app, KeyCode::Char('j'));
    key(&mut app, KeyCode::Down);
    assert_eq!(app.menu.selected_index(), 2);

    key(&mut app, KeyCode::Char('k'));
    assert_eq!(app.menu.selected_index(), 1);
}

#[test]
fn test_k_at_top_wraps_to_quit() {
    let mut app = App::new_for_testing();
    key(&mut app, KeyCode::Char('k'));
    assert_eq!(app.menu.selected_item(), Some(&MenuItem::Quit));
}

#[test]
fn test_number_keys_open_resource_pages() {
    let mut app = App::new_for_testing();
    key(&mut app, KeyCode::Char('2'));
    assert_eq!(app.page, Page::Resource(ResourceId::Project));

    key(&mut app, KeyCode::Tab);
    assert_eq!(app.page, Page::Resource(ResourceId::Nats));

    key(&mut app, KeyCode::Esc);
    assert_eq!(app.page, Page::Main);
    assert!(!app.should_quit);
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[test]
fn test_enter_sends_selected_command() {
    let (mut app, mut rx, _cancel) = app_with_queue();
    key(&mut app, KeyCode::Char('j'));
    key(&mut app, KeyCode::Enter);

    assert_eq!(rx.try_recv().ok(), Some(Command::StopNats));
    assert_eq!(app.last_command, Some(Command::StopNats));
    assert_eq!(app.status_message.as_deref(), Some("Stop NATS requested"));
    assert_eq!(app.page, Page::Resource(ResourceId::Nats));
}

#[test]
fn test_build_command_opens_project_page() {
    let (mut app, mut rx, _cancel) = app_with_queue();
    assert!(app
        .menu
        .select_where(|item| *item == MenuItem::Run(Command::BuildProject)));
    key(&mut app, KeyCode::Enter);

    assert_eq!(rx.try_recv().ok(), Some(Command::BuildProject));
    assert_eq!(app.page, Page::Resource(ResourceId::Project));
}

#[test]
fn test_stopped_dispatcher_is_reported() {
    let (mut app, rx, _cancel) = app_with_queue();
    drop(rx);
    key(&mut app, KeyCode::Enter);

    assert_eq!(
        app.status_message.as_deref(),
        Some("Install NATS could not be sent")
    );
}

#[test]
fn test_quit_item_cancels() {
    let (mut app, _rx, cancel) = app_with_queue();
    assert!(app.menu.select_where(|item| *item == MenuItem::Quit));
    key(&mut app, KeyCode::Enter);

    assert!(app.should_quit);
    assert!(cancel.is_cancelled());
}

#[test]
fn test_ctrl_c_quits_from_anywhere() {
    let mut app = App::new_for_testing();
    app.push_modal(ErrorModal::new("boom", None));
    app.send_key(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert!(app.should_quit);
    assert!(app.is_cancelled());
}

// ---------------------------------------------------------------------------
// Sink messages and error modals
// ---------------------------------------------------------------------------

#[test]
fn test_status_and_inspect_messages_update_panels() {
    let mut app = App::new_for_testing();
    app.handle_ui_message(UiMessage::Status {
        id: ResourceId::Nats,
        text: "Installation state: Ready".to_string(),
    });
    app.handle_ui_message(UiMessage::Inspect {
        id: ResourceId::Nats,
        summary: "Container:  running\n".to_string(),
        logs: "hello\n".to_string(),
    });

    let panel = app.panel(ResourceId::Nats).unwrap();
    assert_eq!(panel.status, "Installation state: Ready");
    assert!(panel.inspect.contains("running"));
    assert_eq!(panel.logs, "hello\n");
    assert!(panel.updated_at.is_some());
    assert!(app.panel(ResourceId::Project).unwrap().status.is_empty());
}

#[test]
fn test_modal_swallows_menu_keys() {
    let (mut app, mut rx, _cancel) = app_with_queue();
    app.push_modal(ErrorModal::new("boom", None));

    key(&mut app, KeyCode::Char('j'));
    assert_eq!(app.menu.selected_index(), 0);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_return_answer_reaches_dispatcher() {
    let mut app = App::new_for_testing();
    app.page = Page::Resource(ResourceId::Nats);
    let (reply, mut answer) = oneshot::channel();
    app.handle_ui_message(UiMessage::ErrorModal {
        message: "stopping NATS failed: Container not found".to_string(),
        reply,
    });
    assert!(app.modal.is_some());

    key(&mut app, KeyCode::Enter);
    assert_eq!(answer.try_recv().ok(), Some(ModalChoice::Return));
    assert!(app.modal.is_none());
    assert_eq!(app.page, Page::Main);
    assert!(!app.should_quit);
}

#[test]
fn test_focus_toggle_then_enter_quits() {
    let mut app = App::new_for_testing();
    let (reply, mut answer) = oneshot::channel();
    app.push_modal(ErrorModal::new("boom", Some(reply)));

    key(&mut app, KeyCode::Right);
    assert_eq!(app.modal.as_ref().map(|m| m.focus), Some(ModalChoice::Quit));
    key(&mut app, KeyCode::Enter);

    assert_eq!(answer.try_recv().ok(), Some(ModalChoice::Quit));
    assert!(app.should_quit);
    assert!(app.is_cancelled());
}

#[test]
fn test_modals_are_shown_one_at_a_time() {
    let mut app = App::new_for_testing();
    let (first_tx, mut first) = oneshot::channel();
    let (second_tx, mut second) = oneshot::channel();
    app.push_modal(ErrorModal::new("first", Some(first_tx)));
    app.push_modal(ErrorModal::new("second", Some(second_tx)));
    assert_eq!(app.queued_modals.len(), 1);

    key(&mut app, KeyCode::Char('r'));
    assert_eq!(first.try_recv().ok(), Some(ModalChoice::Return));
    assert_eq!(app.modal.as_ref().map(|m| m.message.as_str()), Some("second"));

    key(&mut app, KeyCode::Esc);
    assert_eq!(second.try_recv().ok(), Some(ModalChoice::Return));
    assert!(app.modal.is_none());
    assert!(app.queued_modals.is_empty());
}
