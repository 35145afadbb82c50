//! Database repository for words, sessions and statistics.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use rand::Rng;
use tracing::{debug, info, instrument, warn};
use undefine_game::ScoreSummary;

use crate::db::models::NewGameResult;
use crate::db::{DbError, GameResult, NewWord, SessionRow, UserStats, Word, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for word, session and stats operations.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// Each operation opens its own connection, so use a file path rather
    /// than `":memory:"`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path must not be empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Applies any pending schema migrations. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    // ─────────────────────────────────────────────────────────────
    //  Words
    // ─────────────────────────────────────────────────────────────

    /// Inserts a word.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the word already exists or a database error occurs.
    #[instrument(skip(self, word), fields(word = %word.word()))]
    pub fn insert_word(&self, word: NewWord) -> Result<Word, DbError> {
        let mut conn = self.connection()?;

        let word = diesel::insert_into(schema::words::table)
            .values(&word)
            .returning(Word::as_returning())
            .get_result(&mut conn)?;

        info!(word_id = word.id(), "Word inserted");
        Ok(word)
    }

    /// Gets a word by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn fetch_word(&self, word_id: i32) -> Result<Option<Word>, DbError> {
        let mut conn = self.connection()?;

        let word = schema::words::table
            .find(word_id)
            .select(Word::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(found = word.is_some(), "Word lookup");
        Ok(word)
    }

    /// Picks a uniformly random word, or `None` when there are no words.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn random_word(&self) -> Result<Option<Word>, DbError> {
        let mut conn = self.connection()?;

        let count: i64 = schema::words::table.count().get_result(&mut conn)?;
        if count == 0 {
            warn!("No words available");
            return Ok(None);
        }

        let offset = rand::rng().random_range(0..count);
        let word = schema::words::table
            .order(schema::words::id.asc())
            .offset(offset)
            .select(Word::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(offset, "Random word selected");
        Ok(word)
    }

    /// Returns the word assigned to `date`, assigning one if needed.
    ///
    /// A new assignment takes the least-used word that has never been a
    /// daily word, ties broken by id. When every word has been assigned,
    /// earlier assignments are cleared and the pick is retried. Returns
    /// `None` only when there are no words to pick.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn daily_word(&self, date: NaiveDate) -> Result<Option<Word>, DbError> {
        use schema::words::dsl;

        let mut conn = self.connection()?;

        conn.immediate_transaction::<_, DbError, _>(|conn| {
            let assigned = dsl::words
                .filter(dsl::daily_date.eq(date))
                .select(Word::as_select())
                .first(conn)
                .optional()?;
            if let Some(word) = assigned {
                debug!(word_id = word.id(), "Daily word already assigned");
                return Ok(Some(word));
            }

            let mut candidate = Self::least_used_unassigned(conn)?;
            if candidate.is_none() {
                let cleared = diesel::update(dsl::words.filter(dsl::daily_date.lt(date)))
                    .set(dsl::daily_date.eq(None::<NaiveDate>))
                    .execute(conn)?;
                if cleared > 0 {
                    info!(cleared, %date, "Every word has been daily, recycling");
                }
                candidate = Self::least_used_unassigned(conn)?;
            }
            let Some(candidate) = candidate else {
                warn!(%date, "No words available for daily selection");
                return Ok(None);
            };

            let word = diesel::update(dsl::words.find(*candidate.id()))
                .set(dsl::daily_date.eq(date))
                .returning(Word::as_returning())
                .get_result(conn)?;

            info!(word_id = word.id(), %date, "Daily word assigned");
            Ok(Some(word))
        })
    }

    fn least_used_unassigned(conn: &mut SqliteConnection) -> Result<Option<Word>, DbError> {
        use schema::words::dsl;

        Ok(dsl::words
            .filter(dsl::daily_date.is_null())
            .order((dsl::times_used.asc(), dsl::id.asc()))
            .select(Word::as_select())
            .first(conn)
            .optional()?)
    }

    /// Clears every daily assignment. Returns how many words were cleared.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn reset_daily_words(&self) -> Result<usize, DbError> {
        use schema::words::dsl;

        let mut conn = self.connection()?;
        let cleared = diesel::update(dsl::words.filter(dsl::daily_date.is_not_null()))
            .set(dsl::daily_date.eq(None::<NaiveDate>))
            .execute(&mut conn)?;
        info!(cleared, "Daily assignments reset");
        Ok(cleared)
    }

    /// Increments a word's usage counter and stamps its last use.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn mark_used(&self, word_id: i32) -> Result<(), DbError> {
        use schema::words::dsl;

        let mut conn = self.connection()?;
        let updated = diesel::update(dsl::words.find(word_id))
            .set((
                dsl::times_used.eq(dsl::times_used + 1),
                dsl::last_used_at.eq(Some(Utc::now().naive_utc())),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            warn!(word_id, "Tried to mark unknown word as used");
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Sessions
    // ─────────────────────────────────────────────────────────────

    /// Loads a stored session row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn load_session(&self, session_id: &str) -> Result<Option<SessionRow>, DbError> {
        let mut conn = self.connection()?;

        let row = schema::game_sessions::table
            .find(session_id)
            .select(SessionRow::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(found = row.is_some(), "Session lookup");
        Ok(row)
    }

    /// Inserts a new session row. Returns `false` if the id is taken.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on any other database error.
    #[instrument(skip(self, row), fields(session_id = %row.id()))]
    pub fn insert_session(&self, row: &SessionRow) -> Result<bool, DbError> {
        let mut conn = self.connection()?;

        match diesel::insert_into(schema::game_sessions::table)
            .values(row)
            .execute(&mut conn)
        {
            Ok(_) => {
                debug!("Session inserted");
                Ok(true)
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                warn!("Session id already exists");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces a session's state if its stored version is still
    /// `expected_version`. Returns `false` when the version moved on.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, state))]
    pub fn update_session(
        &self,
        session_id: &str,
        expected_version: i64,
        state: &str,
    ) -> Result<bool, DbError> {
        use schema::game_sessions::dsl;

        let mut conn = self.connection()?;
        let updated = diesel::update(
            dsl::game_sessions
                .filter(dsl::id.eq(session_id))
                .filter(dsl::version.eq(expected_version)),
        )
        .set((
            dsl::state.eq(state),
            dsl::version.eq(expected_version + 1),
            dsl::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

        debug!(updated, "Session update attempted");
        Ok(updated == 1)
    }

    /// Deletes a session row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_session(&self, session_id: &str) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        diesel::delete(schema::game_sessions::table.find(session_id)).execute(&mut conn)?;
        debug!("Session deleted");
        Ok(())
    }

    /// Deletes sessions not updated since `cutoff`. Returns how many.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_sessions_before(&self, cutoff: NaiveDateTime) -> Result<usize, DbError> {
        use schema::game_sessions::dsl;

        let mut conn = self.connection()?;
        let deleted =
            diesel::delete(dsl::game_sessions.filter(dsl::updated_at.lt(cutoff))).execute(&mut conn)?;
        info!(deleted, "Idle sessions deleted");
        Ok(deleted)
    }

    // ─────────────────────────────────────────────────────────────
    //  Stats
    // ─────────────────────────────────────────────────────────────

    /// Records a completed game and folds it into the player's aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the session was already recorded or a
    /// database error occurs.
    #[instrument(skip(self, summary), fields(session_id = %summary.session_id(), won = summary.won()))]
    pub fn record_stats(
        &self,
        username: &str,
        word_id: i32,
        summary: &ScoreSummary,
    ) -> Result<UserStats, DbError> {
        let mut conn = self.connection()?;
        let now = Utc::now().naive_utc();

        conn.immediate_transaction::<_, DbError, _>(|conn| {
            let result = NewGameResult::from_summary(username, word_id, summary, now);
            diesel::insert_into(schema::game_results::table)
                .values(&result)
                .execute(conn)?;

            let previous = schema::user_stats::table
                .find(username)
                .select(UserStats::as_select())
                .first(conn)
                .optional()?;

            let stats = UserStats::fold(username, previous.as_ref(), summary, now);
            diesel::replace_into(schema::user_stats::table)
                .values(&stats)
                .execute(conn)?;

            info!(
                username,
                games_played = stats.games_played(),
                current_streak = stats.current_streak(),
                win_rate = %format!("{:.1}%", stats.win_rate()),
                "Stats recorded"
            );
            Ok(stats)
        })
    }

    /// Gets a player's aggregate statistics.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn user_stats(&self, username: &str) -> Result<Option<UserStats>, DbError> {
        let mut conn = self.connection()?;

        let stats = schema::user_stats::table
            .find(username)
            .select(UserStats::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(found = stats.is_some(), "Stats lookup");
        Ok(stats)
    }

    /// Gets a player's completed games, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn game_history(&self, username: &str) -> Result<Vec<GameResult>, DbError> {
        use schema::game_results::dsl;

        let mut conn = self.connection()?;

        let results = dsl::game_results
            .filter(dsl::username.eq(username))
            .order((dsl::played_at.desc(), dsl::id.desc()))
            .select(GameResult::as_select())
            .load(&mut conn)?;

        info!(username, count = results.len(), "Game history loaded");
        Ok(results)
    }
}
