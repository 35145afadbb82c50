//! Terminal state invariant: status, outcomes and end time agree.

use super::Invariant;
use crate::{GameSession, Outcome, SessionStatus};

/// Invariant:
/// - `Active` has no end time and no exact guess
/// - `Won` has an end time and its last guess is the only exact one
/// - `Lost` has an end time and no exact guess
pub struct TerminalStateInvariant;

impl Invariant<GameSession> for TerminalStateInvariant {
    fn holds(session: &GameSession) -> bool {
        let outcomes = session.guess_outcomes();
        let exact_count = outcomes.iter().filter(|o| o.is_exact()).count();
        let ended = session.ended_at().is_some();

        match session.status() {
            SessionStatus::Active => !ended && exact_count == 0,
            SessionStatus::Complete(Outcome::Won) => {
                ended && exact_count == 1 && outcomes.last().is_some_and(|o| o.is_exact())
            }
            SessionStatus::Complete(Outcome::Lost) => ended && exact_count == 0,
        }
    }

    fn description() -> &'static str {
        "Session status agrees with guess outcomes and end time"
    }
}
