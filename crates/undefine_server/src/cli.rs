//! Command-line interface for undefine.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Undefine - daily word-guessing game server
#[derive(Parser, Debug)]
#[command(name = "undefine")]
#[command(about = "Daily word-guessing game server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// TOML config file (defaults to undefine.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Apply pending database migrations
    Migrate {
        /// Path to the database file
        #[arg(long, default_value = "undefine.db")]
        db_path: String,
    },

    /// Import words from a JSON file
    Seed {
        /// Path to the database file
        #[arg(long, default_value = "undefine.db")]
        db_path: String,

        /// JSON array of word records
        file: PathBuf,
    },

    /// Clear every word-of-the-day assignment
    ResetDaily {
        /// Path to the database file
        #[arg(long, default_value = "undefine.db")]
        db_path: String,
    },

    /// Classify a guess against a target word
    Check {
        /// The guess
        guess: String,

        /// The target word
        target: String,

        /// Fuzzy threshold
        #[arg(long, default_value_t = undefine_game::DEFAULT_FUZZY_THRESHOLD)]
        threshold: f64,
    },
}
