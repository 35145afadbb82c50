//! Undefine - Unified CLI
//!
//! Game server, database maintenance and a guess checker.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;
use undefine_game::evaluate;
use undefine_server::{
    GameRepository, GameService, NewWord, ServerConfig, SqliteSessionStore, WordSeed, router,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db_path,
        } => run_server(config, host, port, db_path).await,
        Command::Migrate { db_path } => run_migrate(db_path),
        Command::Seed { db_path, file } => run_seed(db_path, &file),
        Command::ResetDaily { db_path } => run_reset_daily(db_path),
        Command::Check {
            guess,
            target,
            threshold,
        } => {
            let outcome = evaluate(&guess, &target, threshold);
            println!("{}", outcome);
            Ok(())
        }
    }
}

/// Run the HTTP game server
#[instrument(skip_all)]
async fn run_server(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    db_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig::load(config_path.as_deref())?
        .apply_env()?
        .with_overrides(host, port, db_path);
    config.validate()?;

    info!(
        address = %config.bind_address(),
        database = %config.database_path(),
        max_guesses = config.rules().max_guesses(),
        "Starting Undefine server"
    );

    let repository = GameRepository::new(config.database_path().clone())?;
    repository.run_migrations()?;

    let store = Arc::new(SqliteSessionStore::new(repository.clone()));
    let service = GameService::new(store, repository, *config.rules(), config.session_idle());

    spawn_purge_task(service.clone(), config.purge_interval());

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!("Server ready at http://{}/", config.bind_address());

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Periodically removes idle sessions.
fn spawn_purge_task(service: GameService, period: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let service = service.clone();
            match tokio::task::spawn_blocking(move || service.purge_idle()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(error = %e, "Idle session purge failed"),
                Err(e) => warn!(error = %e, "Idle session purge task failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Apply pending migrations
#[instrument]
fn run_migrate(db_path: String) -> Result<()> {
    let repository = GameRepository::new(db_path)?;
    let applied = repository.run_migrations()?;
    println!("Applied {} migration(s)", applied);
    Ok(())
}

/// Clear word-of-the-day assignments
#[instrument]
fn run_reset_daily(db_path: String) -> Result<()> {
    let repository = GameRepository::new(db_path)?;
    repository.run_migrations()?;
    let cleared = repository.reset_daily_words()?;
    println!("Cleared {} daily assignment(s)", cleared);
    Ok(())
}

/// Import words from a JSON file
#[instrument(skip(file), fields(file = %file.display()))]
fn run_seed(db_path: String, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let seeds: Vec<WordSeed> =
        serde_json::from_str(&content).context("Seed file must be a JSON array of words")?;

    let repository = GameRepository::new(db_path)?;
    repository.run_migrations()?;

    let total = seeds.len();
    let mut inserted = 0;
    for seed in seeds {
        let word = NewWord::from(seed);
        let label = word.word().clone();
        match repository.insert_word(word) {
            Ok(_) => inserted += 1,
            Err(e) => warn!(word = %label, error = %e, "Skipping word"),
        }
    }

    info!(inserted, total, "Seeding finished");
    println!("Inserted {} of {} word(s)", inserted, total);
    Ok(())
}
