//! Database persistence layer for words, sessions and player statistics.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::DbError;
pub use models::{GameResult, NewWord, SessionRow, UserStats, Word, WordSeed};
pub use repository::GameRepository;
