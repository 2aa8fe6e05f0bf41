use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::{info, warn};
use upkeep_core::UpkeepConfig;
use upkeep_maintenance::MaintenanceStore;
use upkeep_scheduler::{Materializer, RunHistory, SchedulerEngine};
use upkeep_users::UserStore;

mod app;
mod auth;
mod error;
mod http;

/// Upkeep: recurring home and vehicle maintenance tracker.
#[derive(Parser)]
#[command(name = "upkeep-gateway", version, about)]
struct Cli {
    /// Path to TOML configuration file (falls back to UPKEEP_CONFIG, then
    /// ~/.upkeep/upkeep.toml).
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and the background job (default).
    Serve,
    /// Run one materialization pass and print its summary.
    Materialize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upkeep_gateway=info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    // explicit path > UPKEEP_CONFIG env > ~/.upkeep/upkeep.toml
    let config_path = cli.config.or_else(|| std::env::var("UPKEEP_CONFIG").ok());
    let config = UpkeepConfig::load(config_path.as_deref())?;
    if let Err(e) = config.validate() {
        tracing::error!(code = e.code(), "{e}");
        return Err(e.into());
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Materialize => materialize(&config),
    }
}

async fn serve(config: UpkeepConfig) -> anyhow::Result<()> {
    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path)?;
    info!(path = %db_path, "opening SQLite database");

    // Each subsystem gets its own connection; the schema is created by the
    // stores themselves (idempotent).
    let users = UserStore::new(open_db(&db_path)?)?;
    let maintenance = MaintenanceStore::new(open_db(&db_path)?)?;
    let runs = RunHistory::new(open_db(&db_path)?)?;
    info!("database ready");

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine_task = if config.scheduler.enabled {
        let materializer = build_materializer(&config)?;
        let engine = SchedulerEngine::new(materializer, config.scheduler.cadence.clone())?;
        Some(tokio::spawn(async move { engine.run(shutdown_rx).await }))
    } else {
        warn!("scheduler disabled; events and reminders will not be generated");
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let state = Arc::new(app::AppState::new(config, users, maintenance, runs));
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Upkeep gateway listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // signal scheduler to stop
    let _ = shutdown_tx.send(true);
    if let Some(task) = engine_task {
        let _ = task.await;
    }
    info!("shutdown complete");
    Ok(())
}

fn materialize(config: &UpkeepConfig) -> anyhow::Result<()> {
    ensure_parent_dir(&config.database.path)?;
    let materializer = build_materializer(config)?;
    let summary = materializer.run_once(chrono::Utc::now().date_naive())?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Stores for the job, on connections separate from the HTTP handlers'.
fn build_materializer(config: &UpkeepConfig) -> anyhow::Result<Materializer> {
    let path = &config.database.path;
    let store = Arc::new(MaintenanceStore::new(open_db(path)?)?);
    let history = Arc::new(RunHistory::new(open_db(path)?)?);
    Ok(Materializer::new(store, history, config.scheduler.upcoming))
}

fn open_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")?;
    Ok(conn)
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) -> upkeep_core::Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("could not listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
