//! End-of-session summary handed to the stats collaborator.

use crate::phases::Outcome;
use crate::session::SessionId;
use chrono::TimeDelta;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Counts and timing for one completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    session_id: SessionId,
    guesses_used: usize,
    hints_used: usize,
    fuzzy_matches: usize,
    elapsed_ms: i64,
    outcome: Outcome,
}

impl ScoreSummary {
    /// Creates a summary. Built by [`crate::GameSession::score`].
    pub(crate) fn new(
        session_id: SessionId,
        guesses_used: usize,
        hints_used: usize,
        fuzzy_matches: usize,
        elapsed_ms: i64,
        outcome: Outcome,
    ) -> Self {
        Self {
            session_id,
            guesses_used,
            hints_used,
            fuzzy_matches,
            elapsed_ms,
            outcome,
        }
    }

    /// Returns true if the session was won.
    pub fn won(&self) -> bool {
        self.outcome.is_win()
    }

    /// Time from start to completion.
    pub fn elapsed(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.elapsed_ms)
    }

    /// Whole seconds from start to completion.
    pub fn elapsed_seconds(&self) -> i64 {
        self.elapsed_ms / 1000
    }
}

impl std::fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} in {} guesses with {} hints ({}s)",
            self.outcome,
            self.guesses_used,
            self.hints_used,
            self.elapsed_seconds()
        )
    }
}
