//! dockwatch - container status TUI for the NATS and project test containers

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dockwatch_config::GlobalConfig;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "dockwatch")]
#[command(author, version, about = "Container status dashboard for NATS and project test containers", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file (defaults to dockwatch.log in the data directory)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Demo mode (show TUI without a Docker daemon)
    #[arg(long)]
    demo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration
    Config {
        /// Print the config file path instead
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => GlobalConfig::config_path()?,
    };
    let config = GlobalConfig::load_from(&config_path)?;

    if let Some(Commands::Config { path }) = cli.command {
        if path {
            println!("{}", config_path.display());
        } else {
            print!("{}", commands::config(&config)?);
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            ctrl_c.cancel();
        }
    });

    if cli.demo {
        dockwatch_tui::run_demo(&config, cancel).await?;
    } else {
        commands::tui(&config, cancel).await?;
    }
    Ok(())
}

/// Send tracing output to a file; the TUI owns the terminal
fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let path = match log_file {
        Some(path) => path.to_path_buf(),
        None => GlobalConfig::data_dir()?.join("dockwatch.log"),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    Ok(())
}
