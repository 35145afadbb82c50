//! Undefine server - REST API, persistence and orchestration for the
//! daily word-guessing game.
//!
//! # Architecture
//!
//! - **Database**: words, stored sessions and player stats (SQLite via diesel)
//! - **Store**: the [`SessionStore`] seam with in-memory and SQLite backends
//! - **Service**: [`GameService`] runs the load-mutate-save cycle for each call
//! - **HTTP**: axum routes over the service
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use undefine_server::{GameRepository, GameService, ServerConfig, SqliteSessionStore, router};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default();
//! let repository = GameRepository::new(config.database_path().clone())?;
//! repository.run_migrations()?;
//!
//! let store = Arc::new(SqliteSessionStore::new(repository.clone()));
//! let service = GameService::new(store, repository, *config.rules(), config.session_idle());
//!
//! let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//! axum::serve(listener, router(service)).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod db;
mod http;
mod service;
mod store;

// Crate-level exports - Configuration
pub use config::{ConfigError, DEFAULT_CONFIG_FILE, ServerConfig};

// Crate-level exports - Database
pub use db::{DbError, GameRepository, GameResult, NewWord, SessionRow, UserStats, Word, WordSeed};

// Crate-level exports - HTTP
pub use http::{
    ApiError, GuessRequest, HintRequest, PlayerStatsResponse, StartGameRequest, router,
};

// Crate-level exports - Service
pub use service::{
    GameService, GuessRecord, GuessResponse, HintReveal, RevealedClue, ServiceError,
    SessionView, StartedGame, WordSelection, generate_session_id,
};

// Crate-level exports - Session storage
pub use store::{
    InMemorySessionStore, SessionStore, SqliteSessionStore, StoreError, StoredSession,
};
