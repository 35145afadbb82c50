//! Budget invariant: guesses never exceed the session's limit.

use super::Invariant;
use crate::GameSession;

/// Invariant: at most `max_guesses` guesses, and a spent budget means the
/// session is complete.
pub struct GuessBudgetInvariant;

impl Invariant<GameSession> for GuessBudgetInvariant {
    fn holds(session: &GameSession) -> bool {
        let max = usize::from(*session.rules().max_guesses());
        let used = session.guesses().len();
        used < max || (used == max && session.is_complete())
    }

    fn description() -> &'static str {
        "Guess count stays within budget and a spent budget ends the session"
    }
}
