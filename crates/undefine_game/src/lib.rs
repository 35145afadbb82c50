//! Undefine game logic - the session engine for a daily word-guessing game.
//!
//! A player receives progressive clues about a hidden word and submits
//! guesses until they solve it or exhaust their guess budget.
//!
//! # Architecture
//!
//! - **Clues**: the six hint categories and their fixed reveal order
//! - **Evaluator**: exact / fuzzy / miss classification of a guess
//! - **Session**: the state machine owning one play-through
//! - **Contracts & invariants**: checks applied to every guess transition
//!
//! # Example
//!
//! ```
//! use undefine_game::{ClueRecord, GameRules, GameSession, GuessOutcome, WordClues};
//!
//! let clues = WordClues::try_from(ClueRecord {
//!     definition: Some("To state the meaning of".to_string()),
//!     first_letter: Some("d".to_string()),
//!     number_of_letters: Some(6),
//!     ..ClueRecord::default()
//! })?;
//! let mut session = GameSession::new("game-1".to_string(), "define", clues, GameRules::default());
//!
//! session.reveal_hint(0)?;
//! let feedback = session.submit_guess("define")?;
//! assert_eq!(*feedback.outcome(), GuessOutcome::Exact);
//! assert!(session.is_won());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod clues;
mod contracts;
mod error;
mod evaluator;
pub mod invariants;
mod phases;
mod rules;
mod score;
mod session;

pub use clues::{ClueError, ClueRecord, Equivalents, HINT_SLOT_COUNT, HintSlot, WordClues};
pub use contracts::{Contract, GuessContract, GuessNotBlank, SessionOpen};
pub use error::SessionError;
pub use evaluator::{GuessOutcome, evaluate, mismatched_positions, normalize};
pub use phases::{Outcome, SessionStatus};
pub use rules::{DEFAULT_FUZZY_THRESHOLD, DEFAULT_MAX_GUESSES, GameRules, RulesError};
pub use score::ScoreSummary;
pub use session::{GameSession, GuessFeedback, SessionId};
