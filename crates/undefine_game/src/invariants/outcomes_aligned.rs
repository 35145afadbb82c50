//! Alignment invariant: every guess has exactly one outcome.

use super::Invariant;
use crate::GameSession;

/// Invariant: `guesses` and `guess_outcomes` have equal length.
pub struct OutcomesAlignedInvariant;

impl Invariant<GameSession> for OutcomesAlignedInvariant {
    fn holds(session: &GameSession) -> bool {
        session.guesses().len() == session.guess_outcomes().len()
    }

    fn description() -> &'static str {
        "Every guess has exactly one recorded outcome"
    }
}
