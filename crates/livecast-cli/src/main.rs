//! Livecast client binary.
//!
//! # Usage
//!
//! ```bash
//! # Watch whatever is live, as an anonymous viewer
//! livecast --endpoint https://example.com/api/stats --url https://youtu.be/dQw4w9WgXcQ
//!
//! # Connect as a viewer who can broadcast
//! LIVECAST_VIEWER=0xabc livecast --endpoint https://example.com/api/stats
//! ```
//!
//! Commands are read from stdin, one per line; `/help` lists them.

use std::time::Duration;

use clap::Parser;
use livecast_app::{Command, Runtime, RuntimeConfig, Update, transport::HttpStore};
use livecast_cli::{CliError, HELP, Input, Presenter, parse_line};
use livecast_core::{ControllerConfig, DEFAULT_STREAM_TITLE};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Livecast client
#[derive(Parser, Debug)]
#[command(name = "livecast")]
#[command(about = "Watch, chat on, and broadcast to a shared live slot")]
#[command(version)]
struct Args {
    /// Stats endpoint of the shared store
    #[arg(short, long, env = "LIVECAST_ENDPOINT")]
    endpoint: String,

    /// Viewer id to connect as; omit to watch anonymously
    #[arg(long, env = "LIVECAST_VIEWER")]
    viewer: Option<String>,

    /// Video URL to load at startup
    #[arg(short, long)]
    url: Option<String>,

    /// Title sent when claiming the slot
    #[arg(long, default_value = DEFAULT_STREAM_TITLE)]
    title: String,

    /// Delay between polls in milliseconds
    #[arg(long, default_value = "1000")]
    poll_interval_ms: u64,

    /// Give up restoring a lost slot after this many consecutive attempts
    #[arg(long)]
    reassert_limit: Option<u32>,

    /// Keep polling even with no video loaded
    #[arg(long)]
    poll_while_idle: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let store = HttpStore::new(&args.endpoint)?;
    tracing::info!(endpoint = store.endpoint(), "livecast starting");

    let controller_config = ControllerConfig {
        stream_title: args.title,
        reassert_limit: args.reassert_limit,
        poll_while_idle: args.poll_while_idle,
    };
    let runtime_config = RuntimeConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms.max(1)),
        ..RuntimeConfig::default()
    };

    let (runtime, mut handle) = Runtime::new(store, controller_config, runtime_config);
    let stop = handle.stop_handle();
    let task = tokio::spawn(runtime.run());

    if let Some(viewer) = args.viewer {
        handle.send(Command::SetViewer(Some(viewer))).await?;
    }
    if let Some(url) = args.url {
        handle.send(Command::SetRequestedUrl(url)).await?;
    }

    let mut presenter = Presenter::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.map_err(CliError::from)? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(Input::Command(command)) => handle.send(command).await?,
                    Ok(Input::Help) => tracing::info!("commands:\n{HELP}"),
                    Ok(Input::Quit) => break,
                    Ok(Input::Empty) => {},
                    Err(e) => tracing::warn!("{e}"),
                }
            },

            update = handle.next_update() => match update {
                Some(Update::View(session)) => {
                    for line in presenter.present(&session) {
                        tracing::info!("{line}");
                    }
                },
                Some(Update::Alert(alert)) => tracing::warn!("{alert}"),
                None => break,
            },

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    stop.stop();
    task.await?;
    tracing::info!("livecast stopped");
    Ok(())
}
