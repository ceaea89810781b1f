//! tlab-lf (Label Forms) - trip labeling service
//!
//! Serves the tandem quick form (document store) and the full trip form
//! (spreadsheet) as a JSON API on port 5810 by default.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tlab_common::config::{database_path, TomlConfig};
use tlab_common::db::init_database;
use tlab_lf::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for tlab-lf
#[derive(Parser, Debug)]
#[command(name = "tlab-lf")]
#[command(about = "Trip label forms service")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to ~/.config/tlab/config.toml, then /etc/tlab/config.toml)
    #[arg(short, long, env = "TLAB_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding tlab.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "TLAB_LF_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read before tracing starts so the configured level applies
    let config = TomlConfig::resolve(args.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tlab_lf={}", level).parse()?)
                .add_directive(format!("tlab_common={}", level).parse()?),
        )
        .init();

    info!(
        "Starting TLAB Label Forms (tlab-lf) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = config.context("Failed to load configuration")?;
    let forms = config.label_forms.clone();
    if forms.login.is_empty() {
        anyhow::bail!(
            "No login secret configured: set label_forms.login or {}",
            tlab_common::config::ENV_LOGIN
        );
    }

    let root_folder = config.root_folder(args.root_folder.as_deref());
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::with_sqlite(pool, &forms);
    state
        .sheet_labels
        .ensure_worksheet(state.sheet.as_ref())
        .await
        .context("Failed to prepare label worksheet")?;

    let app = build_router(state);

    let port = args.port.unwrap_or(forms.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("tlab-lf listening on http://{}", addr);
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
