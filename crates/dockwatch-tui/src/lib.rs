//! TUI application for dockwatch
//!
//! Built with Ratatui. The aggregation loops publish into a [`TuiSink`],
//! the render loop in [`App::run`] drains it and redraws.

pub mod app;
mod demo;
mod event;
mod sink;
pub mod ui;
pub mod widgets;

pub use app::{App, AppError, AppResult, ErrorModal, MenuItem, Page, ResourcePanel};
pub use demo::{demo_controllers, DemoNetwork, DemoResource};
pub use event::{Event, EventHandler};
pub use sink::{TuiSink, UiMessage};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dockwatch_config::GlobalConfig;
use dockwatch_core::Session;
use dockwatch_provider::{NetworkController, ResourceController};
use ratatui::prelude::*;
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run the TUI against the given controllers until the user quits or
/// `cancel` fires
pub async fn run(
    nats: Arc<dyn ResourceController>,
    project: Arc<dyn ResourceController>,
    network: Arc<dyn NetworkController>,
    config: &GlobalConfig,
    cancel: CancellationToken,
) -> AppResult<()> {
    let (sink, ui_rx) = TuiSink::channel();
    let session = Session::start(nats, project, network, Arc::new(sink), config, cancel).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&session, ui_rx);
    let res = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    session.shutdown().await;
    res
}

/// Run the TUI against scripted controllers, no Docker needed
pub async fn run_demo(config: &GlobalConfig, cancel: CancellationToken) -> AppResult<()> {
    let (nats, project, network) = demo_controllers(config);
    run(nats, project, network, config, cancel).await
}
