//! Contract-based validation for session transitions.
//!
//! Contracts define correctness through preconditions and postconditions:
//! {P} action {Q}.

use crate::error::SessionError;
use crate::invariants::{InvariantSet, SessionInvariants};
use crate::session::GameSession;
use tracing::instrument;

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A: ?Sized> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), SessionError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), SessionError>;
}

/// Precondition: the session still accepts guesses.
pub struct SessionOpen;

impl SessionOpen {
    /// Fails with [`SessionError::SessionClosed`] on a complete session or
    /// a spent budget.
    #[instrument(skip(session))]
    pub fn check(session: &GameSession) -> Result<(), SessionError> {
        if session.is_complete() || session.remaining_guesses() == 0 {
            Err(SessionError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

/// Precondition: the guess has visible content.
pub struct GuessNotBlank;

impl GuessNotBlank {
    /// Fails with [`SessionError::InvalidGuess`] on blank text.
    #[instrument]
    pub fn check(guess: &str) -> Result<(), SessionError> {
        if guess.trim().is_empty() {
            Err(SessionError::InvalidGuess)
        } else {
            Ok(())
        }
    }
}

/// Contract for guess submission.
///
/// Preconditions:
/// - Session is open
/// - Guess is not blank
///
/// Postconditions:
/// - Exactly one guess and one outcome were appended
/// - Revealed hints did not change
/// - All session invariants hold
pub struct GuessContract;

impl Contract<GameSession, str> for GuessContract {
    fn pre(session: &GameSession, guess: &str) -> Result<(), SessionError> {
        SessionOpen::check(session)?;
        GuessNotBlank::check(guess)
    }

    fn post(before: &GameSession, after: &GameSession) -> Result<(), SessionError> {
        if after.guesses().len() != before.guesses().len() + 1 {
            return Err(SessionError::InvariantViolation(
                "Postcondition failed: guess not appended exactly once".to_string(),
            ));
        }
        if after.revealed_hints() != before.revealed_hints() {
            return Err(SessionError::InvariantViolation(
                "Postcondition failed: revealed hints changed by a guess".to_string(),
            ));
        }
        SessionInvariants::check_all(after).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            SessionError::InvariantViolation(format!("Postcondition failed: {}", descriptions))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clues::{ClueRecord, WordClues};
    use crate::rules::GameRules;

    fn session() -> GameSession {
        let clues = WordClues::try_from(ClueRecord {
            definition: Some("Feline".to_string()),
            first_letter: Some("c".to_string()),
            number_of_letters: Some(3),
            ..ClueRecord::default()
        })
        .unwrap();
        GameSession::new("game-c".to_string(), "cat", clues, GameRules::default())
    }

    #[test]
    fn test_precondition_open_session() {
        assert!(GuessContract::pre(&session(), "dog").is_ok());
    }

    #[test]
    fn test_precondition_blank_guess() {
        assert_eq!(
            GuessContract::pre(&session(), "\t"),
            Err(SessionError::InvalidGuess)
        );
    }

    #[test]
    fn test_precondition_closed_session() {
        let mut s = session();
        s.submit_guess("cat").unwrap();
        assert_eq!(
            GuessContract::pre(&s, "dog"),
            Err(SessionError::SessionClosed)
        );
    }

    #[test]
    fn test_postcondition_holds_after_guess() {
        let before = session();
        let mut after = before.clone();
        after.submit_guess("cot").unwrap();
        assert!(GuessContract::post(&before, &after).is_ok());
    }

    #[test]
    fn test_postcondition_detects_hint_change() {
        let before = session();
        let mut after = before.clone();
        after.submit_guess("cot").unwrap();
        after.reveal_hint(3).unwrap();
        assert!(GuessContract::post(&before, &after).is_err());
    }
}
