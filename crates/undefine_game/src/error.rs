//! Errors raised by session operations.

/// A rejected session operation. The session is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// Guess text is empty or whitespace only.
    #[display("Guess must not be empty")]
    InvalidGuess,

    /// The session already reached a terminal state or spent its budget.
    #[display("Session is already complete")]
    SessionClosed,

    /// Hint slot index outside 0-5.
    #[display("Hint slot {_0} does not exist")]
    InvalidHintSlot(u8),

    /// Scoring requested before the session completed.
    #[display("Session is still active")]
    NotComplete,

    /// A postcondition failed after a transition.
    #[display("Invariant violation: {_0}")]
    InvariantViolation(String),
}

impl std::error::Error for SessionError {}
