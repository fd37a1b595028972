//! Main TUI application state and logic

use crate::event::{Event, EventHandler};
use crate::sink::UiMessage;
use crate::ui;
use crate::widgets::MenuList;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyModifiers};
use dockwatch_core::{Command, CommandSender, ModalChoice, Session, StatusHandle};
use dockwatch_provider::ResourceId;
use ratatui::prelude::*;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] dockwatch_core::CoreError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Which page is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Command menu with a short overview of every resource
    Main,
    /// Full status, inspect and logs of one resource
    Resource(ResourceId),
}

/// Main menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Run(Command),
    Quit,
}

impl MenuItem {
    pub fn all() -> Vec<MenuItem> {
        Command::all()
            .iter()
            .copied()
            .map(MenuItem::Run)
            .chain(std::iter::once(MenuItem::Quit))
            .collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Run(command) => command.label(),
            MenuItem::Quit => "Quit",
        }
    }
}

/// Latest view of one resource
#[derive(Debug, Clone, Default)]
pub struct ResourcePanel {
    /// Rendered status block
    pub status: String,
    pub download_percent: f64,
    pub extract_percent: f64,
    /// Rendered inspect block
    pub inspect: String,
    pub logs: String,
    pub updated_at: Option<DateTime<Local>>,
}

/// An error waiting for the user's answer
#[derive(Debug)]
pub struct ErrorModal {
    pub message: String,
    pub focus: ModalChoice,
    reply: Option<oneshot::Sender<ModalChoice>>,
}

impl ErrorModal {
    pub fn new(message: impl Into<String>, reply: Option<oneshot::Sender<ModalChoice>>) -> Self {
        Self {
            message: message.into(),
            focus: ModalChoice::Return,
            reply,
        }
    }
}

/// Application state
pub struct App {
    pub page: Page,
    pub menu: MenuList<MenuItem>,
    pub panels: BTreeMap<ResourceId, ResourcePanel>,
    /// Modal currently shown
    pub modal: Option<ErrorModal>,
    /// Modals raised while another one is open
    pub queued_modals: VecDeque<ErrorModal>,
    /// Last command sent from the menu
    pub last_command: Option<Command>,
    pub status_message: Option<String>,
    pub spinner_frame: usize,
    pub should_quit: bool,
    commands: Option<CommandSender>,
    handles: Vec<StatusHandle>,
    ui_rx: Option<mpsc::UnboundedReceiver<UiMessage>>,
    cancel: CancellationToken,
}

impl App {
    /// Create an app bound to a running session
    pub fn new(session: &Session, ui_rx: mpsc::UnboundedReceiver<UiMessage>) -> Self {
        let mut app = Self::detached(session.cancel_token());
        app.commands = Some(session.commands());
        app.handles = session.handles().to_vec();
        app.ui_rx = Some(ui_rx);
        app.refresh_from_handles();
        app
    }

    fn detached(cancel: CancellationToken) -> Self {
        let panels = ResourceId::all()
            .iter()
            .map(|id| (*id, ResourcePanel::default()))
            .collect();
        Self {
            page: Page::Main,
            menu: MenuList::new(MenuItem::all()),
            panels,
            modal: None,
            queued_modals: VecDeque::new(),
            last_command: None,
            status_message: None,
            spinner_frame: 0,
            should_quit: false,
            commands: None,
            handles: Vec::new(),
            ui_rx: None,
            cancel,
        }
    }

    /// App with no session attached, for tests
    #[cfg(any(test, feature = "test-support"))]
    pub fn new_for_testing() -> Self {
        Self::detached(CancellationToken::new())
    }

    /// App wired to a bare command queue, for tests
    #[cfg(any(test, feature = "test-support"))]
    pub fn with_commands(commands: CommandSender, cancel: CancellationToken) -> Self {
        let mut app = Self::detached(cancel);
        app.commands = Some(commands);
        app
    }

    /// Run the application main loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> AppResult<()> {
        let mut events = EventHandler::new(Duration::from_millis(100));

        while !self.should_quit {
            self.refresh_from_handles();
            terminal.draw(|frame| ui::draw(frame, self))?;

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.should_quit = true;
                }
                event = events.next() => {
                    match event {
                        Some(e) => self.handle_event(e),
                        None => self.should_quit = true,
                    }
                }
                message = Self::recv_ui(&mut self.ui_rx) => {
                    match message {
                        Some(m) => self.handle_ui_message(m),
                        None => self.ui_rx = None,
                    }
                }
            }
        }

        self.cancel.cancel();
        Ok(())
    }

    async fn recv_ui(rx: &mut Option<mpsc::UnboundedReceiver<UiMessage>>) -> Option<UiMessage> {
        match rx {
            Some(ref mut receiver) => receiver.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Pull progress percentages from the published snapshots
    pub fn refresh_from_handles(&mut self) {
        for handle in &self.handles {
            let snapshot = handle.snapshot();
            if let Some(panel) = self.panels.get_mut(&handle.id()) {
                panel.download_percent = snapshot.download_percent;
                panel.extract_percent = snapshot.extract_percent;
            }
        }
    }

    pub fn handle_ui_message(&mut self, message: UiMessage) {
        match message {
            UiMessage::Status { id, text } => {
                let panel = self.panels.entry(id).or_default();
                panel.status = text;
                panel.updated_at = Some(Local::now());
            }
            UiMessage::Inspect { id, summary, logs } => {
                let panel = self.panels.entry(id).or_default();
                panel.inspect = summary;
                panel.logs = logs;
                panel.updated_at = Some(Local::now());
            }
            UiMessage::ErrorModal { message, reply } => {
                self.push_modal(ErrorModal::new(message, Some(reply)));
            }
        }
    }

    /// Show a modal now, or after the ones already open
    pub fn push_modal(&mut self, modal: ErrorModal) {
        if self.modal.is_none() {
            self.modal = Some(modal);
        } else {
            self.queued_modals.push_back(modal);
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.send_key(key.code, key.modifiers),
            Event::Tick => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
            }
            Event::Resize(_, _) => {
                // Redrawn on the next loop iteration
            }
        }
    }

    /// Handle one key press
    pub fn send_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }

        if self.modal.is_some() {
            self.handle_modal_key(code);
            return;
        }

        match self.page {
            Page::Main => self.handle_main_key(code),
            Page::Resource(_) => self.handle_resource_key(code),
        }
    }

    fn handle_main_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('j') | KeyCode::Down => self.menu.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.menu.select_prev(),
            KeyCode::Enter => {
                if let Some(item) = self.menu.selected_item().copied() {
                    self.activate(item);
                }
            }
            KeyCode::Char('1') => self.page = Page::Resource(ResourceId::Nats),
            KeyCode::Char('2') => self.page = Page::Resource(ResourceId::Project),
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            _ => {}
        }
    }

    fn handle_resource_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => self.page = Page::Main,
            KeyCode::Tab => {
                if let Page::Resource(id) = self.page {
                    let next = match id {
                        ResourceId::Nats => ResourceId::Project,
                        ResourceId::Project => ResourceId::Nats,
                    };
                    self.page = Page::Resource(next);
                }
            }
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                if let Some(modal) = self.modal.as_mut() {
                    modal.focus = match modal.focus {
                        ModalChoice::Return => ModalChoice::Quit,
                        ModalChoice::Quit => ModalChoice::Return,
                    };
                }
            }
            KeyCode::Enter => {
                if let Some(focus) = self.modal.as_ref().map(|m| m.focus) {
                    self.answer_modal(focus);
                }
            }
            KeyCode::Esc | KeyCode::Char('r') => self.answer_modal(ModalChoice::Return),
            KeyCode::Char('q') => self.answer_modal(ModalChoice::Quit),
            _ => {}
        }
    }

    fn answer_modal(&mut self, choice: ModalChoice) {
        let Some(mut modal) = self.modal.take() else {
            return;
        };
        if let Some(reply) = modal.reply.take() {
            // The dispatcher may already be gone during shutdown
            let _ = reply.send(choice);
        }
        self.modal = self.queued_modals.pop_front();

        match choice {
            ModalChoice::Return => self.page = Page::Main,
            ModalChoice::Quit => self.quit(),
        }
    }

    fn activate(&mut self, item: MenuItem) {
        let command = match item {
            MenuItem::Quit => {
                self.quit();
                return;
            }
            MenuItem::Run(command) => command,
        };

        let sent = self
            .commands
            .as_ref()
            .map(|commands| commands.send(command))
            .unwrap_or(false);
        self.status_message = Some(if sent {
            format!("{} requested", command.label())
        } else {
            format!("{} could not be sent", command.label())
        });
        self.last_command = Some(command);
        self.page = Page::Resource(command.target());
    }

    fn quit(&mut self) {
        self.should_quit = true;
        self.cancel.cancel();
    }

    pub fn panel(&self, id: ResourceId) -> Option<&ResourcePanel> {
        self.panels.get(&id)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
