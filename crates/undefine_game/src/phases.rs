//! Session lifecycle states.
//!
//! `Active` is the only non-terminal state. A completed session always
//! carries an [`Outcome`].

use serde::{Deserialize, Serialize};

/// Outcome of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Solved with an exact guess.
    Won,
    /// Guess budget exhausted without an exact guess.
    Lost,
}

impl Outcome {
    /// Returns true if the player solved the word.
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Won)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Won => write!(f, "won"),
            Outcome::Lost => write!(f, "lost"),
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "outcome", rename_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting hints and guesses.
    Active,
    /// Terminal; no further mutation.
    Complete(Outcome),
}

impl SessionStatus {
    /// Returns true once a terminal state is reached.
    pub fn is_complete(&self) -> bool {
        matches!(self, SessionStatus::Complete(_))
    }

    /// Returns the outcome if the session is complete.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            SessionStatus::Active => None,
            SessionStatus::Complete(outcome) => Some(*outcome),
        }
    }
}
