//! Tunable game rules.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Default guess budget per session.
pub const DEFAULT_MAX_GUESSES: u8 = 6;

/// Default minimum share of matching positions for a fuzzy match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.7;

/// Difficulty knobs captured by every session at creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Getters)]
pub struct GameRules {
    /// Guesses allowed before the session is lost.
    #[serde(default = "default_max_guesses")]
    max_guesses: u8,

    /// Match fraction at or above which a same-length guess is fuzzy.
    #[serde(default = "default_fuzzy_threshold")]
    fuzzy_threshold: f64,
}

fn default_max_guesses() -> u8 {
    DEFAULT_MAX_GUESSES
}

fn default_fuzzy_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

impl GameRules {
    /// Creates validated rules.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError`] if the guess budget is zero or the threshold
    /// is outside `(0, 1]`.
    #[instrument]
    pub fn new(max_guesses: u8, fuzzy_threshold: f64) -> Result<Self, RulesError> {
        let rules = Self {
            max_guesses,
            fuzzy_threshold,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// Checks the rules, e.g. after deserializing them from a config file.
    ///
    /// # Errors
    ///
    /// See [`GameRules::new`].
    #[instrument]
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.max_guesses == 0 {
            warn!("Rejected zero guess budget");
            return Err(RulesError::ZeroGuesses);
        }
        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            warn!(threshold = self.fuzzy_threshold, "Rejected fuzzy threshold");
            return Err(RulesError::ThresholdOutOfRange(self.fuzzy_threshold));
        }
        Ok(())
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_guesses: DEFAULT_MAX_GUESSES,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

/// Invalid rule values.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display)]
pub enum RulesError {
    /// A session must allow at least one guess.
    #[display("max_guesses must be at least 1")]
    ZeroGuesses,
    /// Threshold must lie in `(0, 1]`.
    #[display("fuzzy_threshold must be in (0, 1], got {_0}")]
    ThresholdOutOfRange(f64),
}

impl std::error::Error for RulesError {}
