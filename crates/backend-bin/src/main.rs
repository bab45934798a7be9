// ============================
// crates/backend-bin/src/main.rs
// ============================
use anyhow::Context;
use backend_lib::{config::Settings, create_router, sweeper, AppState};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "towernotes-server", version, about = "towernotes auth server")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, short, global = true, default_value = backend_lib::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Delete expired refresh tokens and exit
    PurgeExpired,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    init_tracing(&settings);

    let state = Arc::new(AppState::new(settings)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        Command::PurgeExpired => {
            let removed =
                sweeper::sweep_once(state.sessions.as_ref(), state.clock.as_ref()).await?;
            tracing::info!(removed, "purge complete");
            Ok(())
        },
    }
}

async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let sweep = state.settings.sweep_interval().map(|interval| {
        tracing::info!(?interval, "expired-session sweep enabled");
        sweeper::spawn(Arc::clone(&state.sessions), Arc::clone(&state.clock), interval)
    });

    let addr = state.settings.bind_addr;
    let app = create_router(Arc::clone(&state));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweep {
        handle.abort();
    }
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
