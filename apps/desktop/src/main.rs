use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    view::{project_rows, Layout},
    FetchOutcome, SubmitOutcome, SyncController, SyncEvent,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{dispatch, parse_input, Flow};
use config::{load_settings, DEFAULT_CONFIG_FILE};
use render::{render_board, render_rows};

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the message board")]
struct Cli {
    /// Overrides the endpoint from the config file and environment.
    #[arg(long, global = true)]
    endpoint: Option<String>,
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live board: polls, renders and sends lines typed on stdin.
    Watch {
        #[arg(long, default_value = "")]
        name: String,
        /// Terminal width used to pick the layout. Falls back to the
        /// `COLUMNS` exported by the shell, then 80.
        #[arg(long, env = "COLUMNS", default_value_t = 80)]
        width: u16,
    },
    /// Prints the current board once.
    List,
    /// Sends one message.
    Send {
        #[arg(long)]
        name: String,
        #[arg(long)]
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config);
    if let Some(endpoint) = cli.endpoint {
        settings.endpoint = endpoint;
    }
    let sync_config = settings.into_sync_config()?;
    info!(endpoint = %sync_config.endpoint, "using board endpoint");
    let controller = SyncController::connect(sync_config).context("failed to build board client")?;

    match cli.command {
        Command::Watch { name, width } => watch(controller, name, Layout::for_width(width)).await,
        Command::List => list(&controller).await,
        Command::Send { name, text } => send(&controller, &name, &text).await,
    }
}

async fn list(controller: &SyncController) -> Result<()> {
    match controller.fetch_all().await {
        FetchOutcome::Failed(err) => Err(anyhow!(err)).context("failed to fetch messages"),
        _ => {
            println!("{}", render_rows(&project_rows(&controller.messages())));
            Ok(())
        }
    }
}

async fn send(controller: &SyncController, name: &str, text: &str) -> Result<()> {
    match controller.submit(name, text).await {
        SubmitOutcome::Sent => {
            println!("sent");
            Ok(())
        }
        SubmitOutcome::Rejected(err) => bail!("{err}"),
        SubmitOutcome::Failed(err) => Err(anyhow!(err)).context("failed to send message"),
    }
}

async fn watch(controller: Arc<SyncController>, mut name: String, layout: Layout) -> Result<()> {
    let mut events = controller.subscribe();
    controller.set_draft(&name, "");
    let mounting = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move {
            controller.mount().await;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SyncEvent::MessagesReplaced(messages)) => {
                    println!("\n{}", render_board(&project_rows(&messages), &name, layout));
                }
                Ok(SyncEvent::Alert(alert)) => eprintln!("[{}] {}", alert.title, alert.detail),
                Ok(SyncEvent::BusyChanged(busy)) => debug!(?busy, "busy flags changed"),
                Ok(SyncEvent::DraftChanged(_)) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "board renderer fell behind"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if dispatch(&controller, &mut name, parse_input(&line)) == Flow::Quit {
                    break;
                }
            }
        }
    }

    mounting.abort();
    controller.unmount();
    Ok(())
}
