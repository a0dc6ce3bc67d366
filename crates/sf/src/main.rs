mod error;
mod render;

use clap::{Parser, Subcommand};
use error::CliError;
use sf_core::transport::WsConnector;
use sf_core::{FeedClient, FeedUpdate, FeedView, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sf", about = "Stillfrost live telemetry feed")]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true, env = "STILLFROST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the telemetry broadcaster.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        /// Do not emit the demo agent events.
        #[arg(long)]
        no_demo: bool,
    },
    /// Follow the live feed in the terminal, falling back to demo data.
    Watch {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve { port, no_demo } => serve(cli.config, port, no_demo).await,
        Command::Watch { host, port } => watch(cli.config, host, port).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: Option<PathBuf>, port: Option<u16>, no_demo: bool) -> Result<(), CliError> {
    let mut settings = Settings::load(config.as_deref())?;
    if let Some(port) = port {
        settings.serve.port = port;
    }
    if no_demo {
        settings.serve.demo = false;
    }
    let state = sf_serve::AppState::new(settings.serve);
    sf_serve::serve(state, shutdown_signal()).await?;
    Ok(())
}

async fn watch(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), CliError> {
    let mut settings = Settings::load(config.as_deref())?;
    if let Some(host) = host {
        settings.feed.host = host;
    }
    if let Some(port) = port {
        settings.feed.port = port;
    }

    let view = FeedView::new(settings.feed.capacity);
    let mut updates = view.subscribe();
    let connector = WsConnector::from_config(&settings.feed);
    let handle = FeedClient::new(connector, settings.feed, view.clone()).spawn();

    let mut stdout = std::io::stdout();
    render::draw(&mut stdout, &view)?;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            update = updates.recv() => match update {
                Ok(FeedUpdate::Appended(_) | FeedUpdate::State(_)) | Err(RecvError::Lagged(_)) => {
                    render::draw(&mut stdout, &view)?;
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
