//! Session storage.
//!
//! The game core works on one session value at a time; this module owns
//! the mapping from session id to session. Saves are optimistic: a caller
//! saves the version it loaded and the store rejects the write if another
//! save landed in between.

use chrono::{TimeDelta, Utc};
use derive_getters::Getters;
use derive_more::{Display, From};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};
use undefine_game::{GameSession, SessionId};

use crate::db::{DbError, GameRepository, SessionRow};

/// A session plus the bookkeeping the store needs.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct StoredSession {
    session: GameSession,
    username: String,
    word_id: i32,
    version: u64,
}

impl StoredSession {
    /// Wraps a session that has never been saved (version 0).
    pub fn new(session: GameSession, username: String, word_id: i32) -> Self {
        Self {
            session,
            username,
            word_id,
            version: 0,
        }
    }

    /// Mutable access for the load-mutate-save cycle.
    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    /// Session id.
    pub fn id(&self) -> &SessionId {
        self.session.id()
    }
}

/// Session store failure.
#[derive(Debug, Clone, Display, From)]
pub enum StoreError {
    /// Another save landed after this copy was loaded.
    #[display("Session {id} was modified concurrently (expected version {expected})")]
    #[from(skip)]
    Stale {
        /// Session id.
        id: SessionId,
        /// Version the caller loaded.
        expected: u64,
    },

    /// The backing database failed.
    #[display("{_0}")]
    Db(DbError),

    /// The in-memory map's lock was poisoned.
    #[display("Session store lock poisoned")]
    #[from(skip)]
    Poisoned,
}

impl std::error::Error for StoreError {}

/// Storage collaborator for sessions.
///
/// Implementations must make `save` atomic with respect to the version
/// check.
pub trait SessionStore: Send + Sync {
    /// Loads a session by id.
    fn load(&self, id: &str) -> Result<Option<StoredSession>, StoreError>;

    /// Saves a session.
    ///
    /// Version 0 inserts and fails with [`StoreError::Stale`] if the id
    /// exists. Version `n` replaces the stored copy only if it is still at
    /// `n`. Returns the saved copy at its new version.
    fn save(&self, stored: StoredSession) -> Result<StoredSession, StoreError>;

    /// Removes a session. Removing an unknown id is not an error.
    fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// Removes sessions idle for longer than `max_idle`. Returns how many.
    fn purge_idle(&self, max_idle: TimeDelta) -> Result<usize, StoreError>;
}

// ─────────────────────────────────────────────────────────────
//  In-memory store
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Entry {
    stored: StoredSession,
    touched_at: chrono::DateTime<Utc>,
}

/// Process-local store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, Entry>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory session store");
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, Entry>>, StoreError> {
        self.sessions.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Lists stored session ids.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<SessionId>, StoreError> {
        let ids: Vec<_> = self.lock()?.keys().cloned().collect();
        debug!(count = ids.len(), "Listed sessions");
        Ok(ids)
    }
}

impl SessionStore for InMemorySessionStore {
    #[instrument(skip(self))]
    fn load(&self, id: &str) -> Result<Option<StoredSession>, StoreError> {
        let stored = self.lock()?.get(id).map(|e| e.stored.clone());
        if stored.is_none() {
            debug!(session_id = id, "Session not found");
        }
        Ok(stored)
    }

    #[instrument(skip(self, stored), fields(session_id = %stored.id(), version = stored.version))]
    fn save(&self, mut stored: StoredSession) -> Result<StoredSession, StoreError> {
        let mut sessions = self.lock()?;

        let current = sessions.get(stored.id()).map(|e| e.stored.version);
        let fresh = match current {
            None => stored.version == 0,
            Some(v) => v == stored.version && stored.version > 0,
        };
        if !fresh {
            warn!(current = ?current, "Rejected stale session save");
            return Err(StoreError::Stale {
                id: stored.id().clone(),
                expected: stored.version,
            });
        }

        stored.version += 1;
        sessions.insert(
            stored.id().clone(),
            Entry {
                stored: stored.clone(),
                touched_at: Utc::now(),
            },
        );
        debug!(version = stored.version, "Session saved");
        Ok(stored)
    }

    #[instrument(skip(self))]
    fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.lock()?.remove(id);
        Ok(())
    }

    #[instrument(skip(self))]
    fn purge_idle(&self, max_idle: TimeDelta) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, e| e.touched_at >= cutoff);
        let purged = before - sessions.len();
        info!(purged, "Purged idle sessions");
        Ok(purged)
    }
}

// ─────────────────────────────────────────────────────────────
//  SQLite store
// ─────────────────────────────────────────────────────────────

/// Store backed by the `game_sessions` table.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    repository: GameRepository,
}

impl SqliteSessionStore {
    /// Creates a store over an existing repository.
    #[instrument(skip(repository))]
    pub fn new(repository: GameRepository) -> Self {
        info!("Creating SQLite session store");
        Self { repository }
    }

    fn stale(stored: &StoredSession) -> StoreError {
        warn!(session_id = %stored.id(), version = stored.version, "Rejected stale session save");
        StoreError::Stale {
            id: stored.id().clone(),
            expected: stored.version,
        }
    }
}

impl SessionStore for SqliteSessionStore {
    #[instrument(skip(self))]
    fn load(&self, id: &str) -> Result<Option<StoredSession>, StoreError> {
        let Some(row) = self.repository.load_session(id)? else {
            return Ok(None);
        };
        let version = u64::try_from(*row.version()).map_err(|_| {
            DbError::new(format!(
                "Session '{}' has invalid version {}",
                id,
                row.version()
            ))
        })?;
        let session: GameSession = serde_json::from_str(row.state()).map_err(DbError::from)?;
        Ok(Some(StoredSession {
            session,
            username: row.username().clone(),
            word_id: *row.word_id(),
            version,
        }))
    }

    #[instrument(skip(self, stored), fields(session_id = %stored.id(), version = stored.version))]
    fn save(&self, mut stored: StoredSession) -> Result<StoredSession, StoreError> {
        let state = serde_json::to_string(&stored.session).map_err(DbError::from)?;

        let saved = if stored.version == 0 {
            let row = SessionRow::new(
                stored.id().clone(),
                stored.username.clone(),
                stored.word_id,
                state,
                1,
                Utc::now().naive_utc(),
            );
            self.repository.insert_session(&row)?
        } else {
            let expected = i64::try_from(stored.version)
                .map_err(|_| DbError::new("Session version overflow"))?;
            self.repository.update_session(stored.id(), expected, &state)?
        };

        if !saved {
            return Err(Self::stale(&stored));
        }
        stored.version += 1;
        debug!(version = stored.version, "Session saved");
        Ok(stored)
    }

    #[instrument(skip(self))]
    fn remove(&self, id: &str) -> Result<(), StoreError> {
        Ok(self.repository.delete_session(id)?)
    }

    #[instrument(skip(self))]
    fn purge_idle(&self, max_idle: TimeDelta) -> Result<usize, StoreError> {
        let cutoff = (Utc::now() - max_idle).naive_utc();
        Ok(self.repository.delete_sessions_before(cutoff)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use undefine_game::{ClueRecord, GameRules, WordClues};

    fn stored(id: &str) -> StoredSession {
        let clues = WordClues::try_from(ClueRecord {
            definition: Some("Feline".to_string()),
            first_letter: Some("c".to_string()),
            number_of_letters: Some(3),
            ..ClueRecord::default()
        })
        .unwrap();
        let session = GameSession::new(id.to_string(), "cat", clues, GameRules::default());
        StoredSession::new(session, "ada".to_string(), 1)
    }

    #[test]
    fn test_insert_then_load() {
        let store = InMemorySessionStore::new();
        let saved = store.save(stored("game-a")).unwrap();
        assert_eq!(*saved.version(), 1);

        let loaded = store.load("game-a").unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(store.load("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_is_stale() {
        let store = InMemorySessionStore::new();
        store.save(stored("game-a")).unwrap();
        let result = store.save(stored("game-a"));
        assert!(matches!(result, Err(StoreError::Stale { .. })));
    }

    #[test]
    fn test_concurrent_update_is_stale() {
        let store = InMemorySessionStore::new();
        store.save(stored("game-a")).unwrap();

        let mut first = store.load("game-a").unwrap().unwrap();
        let mut second = store.load("game-a").unwrap().unwrap();

        first.session_mut().submit_guess("cot").unwrap();
        store.save(first).unwrap();

        second.session_mut().submit_guess("cut").unwrap();
        assert!(matches!(store.save(second), Err(StoreError::Stale { .. })));

        let current = store.load("game-a").unwrap().unwrap();
        assert_eq!(current.session().guesses(), &["cot".to_string()]);
        assert_eq!(*current.version(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let store = InMemorySessionStore::new();
        let other = store.clone();
        store.save(stored("game-a")).unwrap();
        assert_eq!(other.list().unwrap(), vec!["game-a".to_string()]);
        other.remove("game-a").unwrap();
        assert!(store.load("game-a").unwrap().is_none());
    }

    #[test]
    fn test_purge_idle() {
        let store = InMemorySessionStore::new();
        store.save(stored("game-a")).unwrap();
        assert_eq!(store.purge_idle(TimeDelta::hours(24)).unwrap(), 0);
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.purge_idle(TimeDelta::seconds(-1)).unwrap(), 1);
        assert!(store.list().unwrap().is_empty());
    }
}
