//! tlab-sp (Student Project) - prediction scoring service
//!
//! `tlab-sp serve` (the default) runs the JSON API on port 5811.
//! `tlab-sp load-answer-key <CSV>` imports the answer key once.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tlab_common::config::{database_path, TomlConfig};
use tlab_common::db::init_database;
use tlab_sp::scoring::LabelTable;
use tlab_sp::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for tlab-sp
#[derive(Parser, Debug)]
#[command(name = "tlab-sp")]
#[command(about = "Student project scoring service")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to ~/.config/tlab/config.toml, then /etc/tlab/config.toml)
    #[arg(short, long, env = "TLAB_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Folder holding tlab.db
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long, env = "TLAB_SP_PORT")]
        port: Option<u16>,
    },
    /// Import the answer key from a CSV file with columns trip_id,label
    LoadAnswerKey {
        /// CSV file to import
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::resolve(args.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tlab_sp={}", level).parse()?)
                .add_directive(format!("tlab_common={}", level).parse()?),
        )
        .init();

    info!(
        "Starting TLAB Student Project (tlab-sp) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = config.context("Failed to load configuration")?;
    let project = config.student_project.clone();

    let root_folder = config.root_folder(args.root_folder.as_deref());
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    let state = AppState::with_sqlite(pool, &project);

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::LoadAnswerKey { file } => load_answer_key(&state, &file).await,
        Command::Serve { port } => {
            let port = port.unwrap_or(project.port);
            serve(state, port).await
        }
    }
}

async fn load_answer_key(state: &AppState, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let table = LabelTable::from_csv(&text)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    state
        .workbook
        .import_answer_key(&table)
        .await
        .context("Failed to import answer key")?;

    info!(
        "Answer key imported from {} ({} trips)",
        file.display(),
        table.len()
    );
    Ok(())
}

async fn serve(state: AppState, port: u16) -> Result<()> {
    if state.tokens.is_empty() {
        warn!("No participant tokens configured: every request will be refused");
    }
    match state.workbook.answer_key().await {
        Ok(answer_key) => info!("Answer key holds {} trips", answer_key.len()),
        Err(e) => warn!("Answer key unavailable: {}", e),
    }

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("tlab-sp listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
