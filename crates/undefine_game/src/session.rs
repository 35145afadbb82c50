//! The game session state machine.
//!
//! A [`GameSession`] owns one play-through. It changes only through
//! [`GameSession::reveal_hint`] and [`GameSession::submit_guess`], and it
//! freezes once it reaches a terminal state.

use crate::clues::{HintSlot, WordClues};
use crate::contracts::{Contract, GuessContract};
use crate::error::SessionError;
use crate::evaluator::{self, GuessOutcome};
use crate::phases::{Outcome, SessionStatus};
use crate::rules::GameRules;
use crate::score::ScoreSummary;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};

/// Opaque session identifier.
pub type SessionId = String;

/// One play-through of the daily word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct GameSession {
    /// Session ID.
    id: SessionId,
    /// The word being guessed.
    target_word: String,
    /// Clues for the target word.
    clues: WordClues,
    /// Rules captured at creation.
    rules: GameRules,
    /// Hint slots shown so far.
    pub(crate) revealed_hints: BTreeSet<HintSlot>,
    /// Submitted guesses in attempt order.
    pub(crate) guesses: Vec<String>,
    /// Classification of each guess, parallel to `guesses`.
    pub(crate) guess_outcomes: Vec<GuessOutcome>,
    /// Lifecycle state.
    pub(crate) status: SessionStatus,
    /// When the session was created.
    started_at: DateTime<Utc>,
    /// When the session reached a terminal state.
    pub(crate) ended_at: Option<DateTime<Utc>>,
}

/// What a caller learns from one accepted guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GuessFeedback {
    /// Classification of this guess.
    outcome: GuessOutcome,
    /// Session state after the guess.
    status: SessionStatus,
    /// Guesses left in the budget.
    remaining_guesses: usize,
}

impl GameSession {
    /// Creates an active session starting now.
    #[instrument(skip(target_word, clues), fields(session_id = %id))]
    pub fn new(
        id: SessionId,
        target_word: impl Into<String>,
        clues: WordClues,
        rules: GameRules,
    ) -> Self {
        Self::starting_at(id, target_word, clues, rules, Utc::now())
    }

    /// Creates an active session with an explicit start time.
    #[instrument(skip(target_word, clues), fields(session_id = %id))]
    pub fn starting_at(
        id: SessionId,
        target_word: impl Into<String>,
        clues: WordClues,
        rules: GameRules,
        started_at: DateTime<Utc>,
    ) -> Self {
        info!(max_guesses = rules.max_guesses(), "Creating game session");
        Self {
            id,
            target_word: target_word.into(),
            clues,
            rules,
            revealed_hints: BTreeSet::new(),
            guesses: Vec::new(),
            guess_outcomes: Vec::new(),
            status: SessionStatus::Active,
            started_at,
            ended_at: None,
        }
    }

    /// Returns true once the session reached `Complete`.
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    /// Returns true iff the session completed with an exact guess.
    pub fn is_won(&self) -> bool {
        self.status.outcome().is_some_and(|o| o.is_win())
    }

    /// Guesses left before the budget is spent.
    pub fn remaining_guesses(&self) -> usize {
        usize::from(*self.rules.max_guesses()).saturating_sub(self.guesses.len())
    }

    /// Lowest slot not yet revealed, in canonical order.
    pub fn next_hint(&self) -> Option<HintSlot> {
        HintSlot::iter().find(|slot| !self.revealed_hints.contains(slot))
    }

    /// Reveals the hint at slot `index`.
    ///
    /// Returns `Ok(true)` if the slot was newly revealed. Revealing an
    /// already shown slot, or any slot on a completed session, is a no-op
    /// returning `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidHintSlot`] if `index` is outside 0-5.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn reveal_hint(&mut self, index: u8) -> Result<bool, SessionError> {
        let slot = HintSlot::try_from(index).map_err(|index| {
            warn!(index, "Rejected unknown hint slot");
            SessionError::InvalidHintSlot(index)
        })?;
        Ok(self.reveal(slot))
    }

    /// Reveals a hint by category. See [`GameSession::reveal_hint`].
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn reveal(&mut self, slot: HintSlot) -> bool {
        if self.is_complete() {
            debug!(%slot, "Ignoring hint on completed session");
            return false;
        }
        let inserted = self.revealed_hints.insert(slot);
        if inserted {
            info!(slot = slot.index(), category = slot.code(), "Hint revealed");
        } else {
            debug!(slot = slot.index(), "Hint already revealed");
        }
        inserted
    }

    /// Submits a guess, timestamped now.
    ///
    /// # Errors
    ///
    /// See [`GameSession::submit_guess_at`].
    pub fn submit_guess(&mut self, guess: &str) -> Result<GuessFeedback, SessionError> {
        self.submit_guess_at(guess, Utc::now())
    }

    /// Evaluates `guess`, records it, and applies the termination check.
    ///
    /// The transition is built on a copy and committed only if every
    /// check passes, so a rejected guess leaves the session untouched.
    ///
    /// # Errors
    ///
    /// - [`SessionError::SessionClosed`] if the session is complete or the
    ///   guess budget is spent.
    /// - [`SessionError::InvalidGuess`] if `guess` is blank.
    #[instrument(skip(self, now), fields(session_id = %self.id))]
    pub fn submit_guess_at(
        &mut self,
        guess: &str,
        now: DateTime<Utc>,
    ) -> Result<GuessFeedback, SessionError> {
        GuessContract::pre(self, guess).inspect_err(|e| {
            warn!(error = %e, "Guess rejected");
        })?;

        let outcome = evaluator::evaluate(guess, &self.target_word, *self.rules.fuzzy_threshold());

        let mut next = self.clone();
        next.guesses.push(guess.to_string());
        next.guess_outcomes.push(outcome.clone());

        if outcome.is_exact() {
            next.complete(Outcome::Won, now);
        } else if next.guesses.len() >= usize::from(*next.rules.max_guesses()) {
            next.complete(Outcome::Lost, now);
        }

        #[cfg(debug_assertions)]
        GuessContract::post(self, &next)?;

        *self = next;

        info!(
            attempt = self.guesses.len(),
            %outcome,
            status = ?self.status,
            "Guess recorded"
        );

        Ok(GuessFeedback {
            outcome,
            status: self.status,
            remaining_guesses: self.remaining_guesses(),
        })
    }

    /// Summarizes a completed session for the stats collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotComplete`] while the session is active.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn score(&self) -> Result<ScoreSummary, SessionError> {
        let (SessionStatus::Complete(outcome), Some(ended_at)) = (self.status, self.ended_at)
        else {
            warn!("Score requested for active session");
            return Err(SessionError::NotComplete);
        };

        let fuzzy_matches = self.guess_outcomes.iter().filter(|o| o.is_fuzzy()).count();

        Ok(ScoreSummary::new(
            self.id.clone(),
            self.guesses.len(),
            self.revealed_hints.len(),
            fuzzy_matches,
            (ended_at - self.started_at).num_milliseconds().max(0),
            outcome,
        ))
    }

    fn complete(&mut self, outcome: Outcome, now: DateTime<Utc>) {
        info!(session_id = %self.id, %outcome, "Session complete");
        self.status = SessionStatus::Complete(outcome);
        self.ended_at = Some(now);
    }
}
