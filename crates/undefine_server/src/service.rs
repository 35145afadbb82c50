//! Game orchestration over the session store and the repository.
//!
//! Every mutating call is one load-mutate-save cycle against the
//! [`SessionStore`]. A concurrent writer surfaces as
//! [`StoreError::Stale`] rather than a lost update.

use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use derive_more::{Display, From};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use undefine_game::{
    ClueError, GameRules, GameSession, GuessOutcome, HintSlot, ScoreSummary, SessionError,
    SessionId, SessionStatus,
};

use crate::db::{DbError, GameRepository, GameResult, UserStats, Word};
use crate::store::{SessionStore, StoreError, StoredSession};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 7;

/// How the target word of a new game is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "wordId")]
pub enum WordSelection {
    /// Today's word (UTC date).
    #[default]
    Daily,
    /// Any word, uniformly.
    Random,
    /// A specific word by id.
    Word(i32),
}

/// Service failure.
#[derive(Debug, Clone, Display, From)]
pub enum ServiceError {
    /// The session rejected the operation.
    #[display("{_0}")]
    Session(SessionError),

    /// Session storage failed or the session changed concurrently.
    #[display("{_0}")]
    Store(StoreError),

    /// The word or stats tables failed.
    #[display("{_0}")]
    Db(DbError),

    /// A stored word cannot be played.
    #[display("Word has unusable clues: {_0}")]
    Clues(ClueError),

    /// No session with this id.
    #[display("Game {_0} not found")]
    #[from(skip)]
    SessionNotFound(SessionId),

    /// No word with this id.
    #[display("Word {_0} not found")]
    #[from(skip)]
    WordNotFound(i32),

    /// The word table has nothing to offer.
    #[display("No words available")]
    #[from(skip)]
    NoWordsAvailable,

    /// No stats recorded for this player.
    #[display("No stats for player {_0}")]
    #[from(skip)]
    PlayerNotFound(String),

    /// Blank username.
    #[display("Username must not be empty")]
    #[from(skip)]
    InvalidUsername,
}

impl std::error::Error for ServiceError {}

/// A newly started game.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct StartedGame {
    session_id: SessionId,
    definition: String,
    max_guesses: u8,
    revealed_hints: Vec<u8>,
}

/// Result of a hint request.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct HintReveal {
    slot: u8,
    #[getter(skip)]
    code: &'static str,
    text: Option<String>,
    newly_revealed: bool,
    revealed_hints: Vec<u8>,
}

impl HintReveal {
    /// Get field `code` from instance of `HintReveal`.
    pub fn code(&self) -> &'static str {
        self.code
    }
}

/// Result of a guess submission.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GuessResponse {
    is_correct: bool,
    guess: String,
    is_fuzzy: bool,
    fuzzy_positions: Vec<usize>,
    game_over: bool,
    /// Only set when the game was lost.
    #[serde(skip_serializing_if = "Option::is_none")]
    correct_word: Option<String>,
    remaining_guesses: usize,
}

/// One revealed clue.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct RevealedClue {
    slot: u8,
    code: &'static str,
    text: Option<String>,
}

/// One guess and how it was classified.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GuessRecord {
    guess: String,
    outcome: GuessOutcome,
}

/// Current state of a game as a client sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    session_id: SessionId,
    username: String,
    status: SessionStatus,
    clues: Vec<RevealedClue>,
    guesses: Vec<GuessRecord>,
    remaining_guesses: usize,
    started_at: DateTime<Utc>,
    /// Hidden while the game is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    target_word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<ScoreSummary>,
}

impl SessionView {
    fn from_stored(stored: &StoredSession) -> Self {
        let session = stored.session();
        let clues = session
            .revealed_hints()
            .iter()
            .map(|slot| RevealedClue {
                slot: slot.index(),
                code: slot.code(),
                text: session.clues().reveal(*slot),
            })
            .collect();
        let guesses = session
            .guesses()
            .iter()
            .zip(session.guess_outcomes())
            .map(|(guess, outcome)| GuessRecord {
                guess: guess.clone(),
                outcome: outcome.clone(),
            })
            .collect();

        Self {
            session_id: session.id().clone(),
            username: stored.username().clone(),
            status: *session.status(),
            clues,
            guesses,
            remaining_guesses: session.remaining_guesses(),
            started_at: *session.started_at(),
            target_word: session
                .is_complete()
                .then(|| session.target_word().clone()),
            score: session.score().ok(),
        }
    }
}

/// Service layer for playing games.
///
/// Cheap to clone; clones share the store and repository.
#[derive(Clone)]
pub struct GameService {
    store: Arc<dyn SessionStore>,
    repository: GameRepository,
    rules: GameRules,
    session_idle: TimeDelta,
}

impl std::fmt::Debug for GameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("repository", &self.repository)
            .field("rules", &self.rules)
            .field("session_idle", &self.session_idle)
            .finish_non_exhaustive()
    }
}

impl GameService {
    /// Creates a service.
    #[instrument(skip(store, repository))]
    pub fn new(
        store: Arc<dyn SessionStore>,
        repository: GameRepository,
        rules: GameRules,
        session_idle: TimeDelta,
    ) -> Self {
        info!("Creating GameService");
        Self {
            store,
            repository,
            rules,
            session_idle,
        }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &GameRepository {
        &self.repository
    }

    /// Rules given to new sessions.
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Starts a game for `username` with the Definition clue already shown.
    ///
    /// # Errors
    ///
    /// Fails if no word matches `selection`, the word's clues are unusable,
    /// or the session cannot be saved.
    #[instrument(skip(self))]
    pub fn start_game(
        &self,
        username: &str,
        selection: WordSelection,
    ) -> Result<StartedGame, ServiceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ServiceError::InvalidUsername);
        }

        let word = self.select_word(selection)?;
        let clues = word.clues()?;

        let mut session = GameSession::new(
            generate_session_id(Utc::now()),
            word.word().clone(),
            clues,
            self.rules,
        );
        session.reveal(HintSlot::Definition);

        let started = StartedGame {
            session_id: session.id().clone(),
            definition: session.clues().definition().clone(),
            max_guesses: *self.rules.max_guesses(),
            revealed_hints: revealed_indices(&session),
        };

        self.store
            .save(StoredSession::new(session, username.to_string(), *word.id()))?;

        info!(session_id = %started.session_id, word_id = word.id(), "Game started");
        Ok(started)
    }

    fn select_word(&self, selection: WordSelection) -> Result<Word, ServiceError> {
        let word = match selection {
            WordSelection::Daily => self.repository.daily_word(Utc::now().date_naive())?,
            WordSelection::Random => self.repository.random_word()?,
            WordSelection::Word(id) => {
                return self
                    .repository
                    .fetch_word(id)?
                    .ok_or(ServiceError::WordNotFound(id));
            }
        };
        word.ok_or_else(|| {
            warn!(?selection, "No word to start a game with");
            ServiceError::NoWordsAvailable
        })
    }

    fn load(&self, session_id: &str) -> Result<StoredSession, ServiceError> {
        self.store
            .load(session_id)?
            .ok_or_else(|| ServiceError::SessionNotFound(session_id.to_string()))
    }

    /// Reveals the hint at `slot`.
    ///
    /// Revealing an already shown slot is a no-op and writes nothing.
    ///
    /// # Errors
    ///
    /// Fails on an unknown session or slot, or a concurrent update.
    #[instrument(skip(self))]
    pub fn reveal_hint(&self, session_id: &str, slot: u8) -> Result<HintReveal, ServiceError> {
        let mut stored = self.load(session_id)?;
        let newly_revealed = stored.session_mut().reveal_hint(slot)?;
        if newly_revealed {
            stored = self.store.save(stored)?;
        }

        let session = stored.session();
        let slot = HintSlot::try_from(slot).map_err(SessionError::InvalidHintSlot)?;
        debug!(newly_revealed, code = slot.code(), "Hint request handled");

        Ok(HintReveal {
            slot: slot.index(),
            code: slot.code(),
            text: session.clues().reveal(slot),
            newly_revealed,
            revealed_hints: revealed_indices(session),
        })
    }

    /// Submits a guess.
    ///
    /// When the guess ends the game the word is marked used and the result
    /// is folded into the player's stats. Failures there are logged only;
    /// the game stays complete.
    ///
    /// # Errors
    ///
    /// Fails on an unknown session, a rejected guess, or a concurrent
    /// update.
    #[instrument(skip(self))]
    pub fn submit_guess(&self, session_id: &str, guess: &str) -> Result<GuessResponse, ServiceError> {
        let mut stored = self.load(session_id)?;
        let feedback = stored.session_mut().submit_guess(guess)?;
        let stored = self.store.save(stored)?;
        let session = stored.session();

        if session.is_complete() {
            self.finish(&stored);
        }

        let lost = feedback.status().outcome().is_some_and(|o| !o.is_win());
        Ok(GuessResponse {
            is_correct: feedback.outcome().is_exact(),
            guess: guess.to_string(),
            is_fuzzy: feedback.outcome().is_fuzzy(),
            fuzzy_positions: feedback.outcome().fuzzy_positions().to_vec(),
            game_over: feedback.status().is_complete(),
            correct_word: lost.then(|| session.target_word().clone()),
            remaining_guesses: *feedback.remaining_guesses(),
        })
    }

    #[instrument(skip(self, stored), fields(session_id = %stored.id()))]
    fn finish(&self, stored: &StoredSession) {
        if let Err(e) = self.repository.mark_used(*stored.word_id()) {
            error!(error = %e, "Failed to mark word as used");
        }

        let summary = match stored.session().score() {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Completed session did not score");
                return;
            }
        };
        match self
            .repository
            .record_stats(stored.username(), *stored.word_id(), &summary)
        {
            Ok(stats) => info!(
                won = summary.won(),
                games_played = stats.games_played(),
                "Game finished"
            ),
            Err(e) => error!(error = %e, "Failed to record stats"),
        }
    }

    /// Current state of a game, for reloads.
    ///
    /// # Errors
    ///
    /// Fails on an unknown session or a storage error.
    #[instrument(skip(self))]
    pub fn session_view(&self, session_id: &str) -> Result<SessionView, ServiceError> {
        let stored = self.load(session_id)?;
        Ok(SessionView::from_stored(&stored))
    }

    /// Aggregate stats for a player.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PlayerNotFound`] if the player never finished
    /// a game.
    #[instrument(skip(self))]
    pub fn user_stats(&self, username: &str) -> Result<UserStats, ServiceError> {
        self.repository
            .user_stats(username)?
            .ok_or_else(|| ServiceError::PlayerNotFound(username.to_string()))
    }

    /// Finished games for a player, most recent first.
    ///
    /// # Errors
    ///
    /// Fails on a storage error.
    #[instrument(skip(self))]
    pub fn game_history(&self, username: &str) -> Result<Vec<GameResult>, ServiceError> {
        Ok(self.repository.game_history(username)?)
    }

    /// Deletes sessions idle past the configured limit.
    ///
    /// # Errors
    ///
    /// Fails on a storage error.
    #[instrument(skip(self))]
    pub fn purge_idle(&self) -> Result<usize, ServiceError> {
        let purged = self.store.purge_idle(self.session_idle)?;
        if purged > 0 {
            info!(purged, "Idle sessions purged");
        }
        Ok(purged)
    }
}

fn revealed_indices(session: &GameSession) -> Vec<u8> {
    session.revealed_hints().iter().map(|s| s.index()).collect()
}

/// Builds `game-<unix millis>-<7 base36 chars>`.
pub fn generate_session_id(now: DateTime<Utc>) -> SessionId {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("game-{}-{}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_shape() {
        let now = Utc::now();
        let id = generate_session_id(now);
        let parts: Vec<&str> = id.splitn(3, '-').collect();

        assert_eq!(parts[0], "game");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 7);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_session_ids_differ() {
        let now = Utc::now();
        assert_ne!(generate_session_id(now), generate_session_id(now));
    }

    #[test]
    fn test_word_selection_wire_format() {
        let daily: WordSelection = serde_json::from_str(r#"{"mode":"daily"}"#).unwrap();
        assert_eq!(daily, WordSelection::Daily);

        let word: WordSelection =
            serde_json::from_str(r#"{"mode":"word","wordId":7}"#).unwrap();
        assert_eq!(word, WordSelection::Word(7));
    }
}
