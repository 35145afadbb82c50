//! Guess classification against the target word.
//!
//! Pure functions, no shared state. Both strings are trimmed and
//! lower-cased before comparison.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Classification of a single guess.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GuessOutcome {
    /// Guess equals the target after normalization.
    Exact,
    /// Same length as the target and close enough; `positions` are the
    /// character positions that differ.
    Fuzzy {
        /// Zero-based mismatched positions, ascending.
        positions: Vec<usize>,
    },
    /// Anything else.
    Miss,
}

impl GuessOutcome {
    /// Returns true for [`GuessOutcome::Exact`].
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact)
    }

    /// Returns true for [`GuessOutcome::Fuzzy`].
    pub fn is_fuzzy(&self) -> bool {
        matches!(self, Self::Fuzzy { .. })
    }

    /// Mismatched positions of a fuzzy match; empty otherwise.
    pub fn fuzzy_positions(&self) -> &[usize] {
        match self {
            Self::Fuzzy { positions } => positions,
            Self::Exact | Self::Miss => &[],
        }
    }
}

impl std::fmt::Display for GuessOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuessOutcome::Exact => write!(f, "exact"),
            GuessOutcome::Fuzzy { positions } if positions.len() == 1 => {
                write!(f, "fuzzy, 1 letter off")
            }
            GuessOutcome::Fuzzy { positions } => {
                write!(f, "fuzzy, {} letters off", positions.len())
            }
            GuessOutcome::Miss => write!(f, "miss"),
        }
    }
}

/// Trims surrounding whitespace and lower-cases.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Classifies `guess` against `target`.
///
/// A guess is fuzzy when it has the same character count as the target and
/// `1 - differences / length >= threshold`. Guesses of a different length
/// are only ever exact or miss.
#[instrument(skip(guess, target))]
pub fn evaluate(guess: &str, target: &str, threshold: f64) -> GuessOutcome {
    let guess = normalize(guess);
    let target = normalize(target);

    if guess == target {
        return GuessOutcome::Exact;
    }

    let Some(positions) = mismatched_positions(&guess, &target) else {
        debug!("Length mismatch, no fuzzy match");
        return GuessOutcome::Miss;
    };

    let length = target.chars().count();
    let fraction = 1.0 - positions.len() as f64 / length as f64;
    debug!(fraction, mismatches = positions.len(), "Computed match fraction");

    // Tolerate rounding at the boundary, e.g. 7 of 10 against 0.7.
    if fraction + f64::EPSILON >= threshold {
        GuessOutcome::Fuzzy { positions }
    } else {
        GuessOutcome::Miss
    }
}

/// Positions where two equal-length strings differ, or `None` when the
/// lengths differ or both are empty.
pub fn mismatched_positions(guess: &str, target: &str) -> Option<Vec<usize>> {
    let guess: Vec<char> = guess.chars().collect();
    let target: Vec<char> = target.chars().collect();

    if guess.len() != target.len() || target.is_empty() {
        return None;
    }

    Some(
        guess
            .iter()
            .zip(&target)
            .enumerate()
            .filter(|(_, (g, t))| g != t)
            .map(|(i, _)| i)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::DEFAULT_FUZZY_THRESHOLD as T;

    #[test]
    fn test_exact_ignores_case_and_whitespace() {
        assert_eq!(evaluate(" Cat ", "cat", T), GuessOutcome::Exact);
        assert_eq!(evaluate("DEFINE", "define\n", T), GuessOutcome::Exact);
    }

    #[test]
    fn test_one_letter_off_is_fuzzy() {
        assert_eq!(
            evaluate("hodse", "house", T),
            GuessOutcome::Fuzzy { positions: vec![2] }
        );
    }

    #[test]
    fn test_three_of_five_off_is_miss() {
        assert_eq!(evaluate("zzzle", "apple", T), GuessOutcome::Miss);
    }

    #[test]
    fn test_two_of_five_off_is_miss() {
        // 0.6 < 0.7
        assert_eq!(evaluate("hxyse", "house", T), GuessOutcome::Miss);
    }

    #[test]
    fn test_length_mismatch_never_fuzzy() {
        assert_eq!(evaluate("cats", "cat", T), GuessOutcome::Miss);
        assert_eq!(evaluate("ca", "cat", T), GuessOutcome::Miss);
    }

    #[test]
    fn test_boundary_fraction_is_fuzzy() {
        // 3 of 10 differ, fraction exactly 0.7
        assert_eq!(
            evaluate("abcdefgxyz", "abcdefghij", T),
            GuessOutcome::Fuzzy {
                positions: vec![7, 8, 9]
            }
        );
    }

    #[test]
    fn test_threshold_is_configurable() {
        assert_eq!(evaluate("hxyse", "house", 0.6).fuzzy_positions(), &[1, 2]);
        assert_eq!(evaluate("hodse", "house", 0.9), GuessOutcome::Miss);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(
            evaluate("cafè", "café", T),
            GuessOutcome::Fuzzy { positions: vec![3] }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(GuessOutcome::Exact.to_string(), "exact");
        assert_eq!(
            GuessOutcome::Fuzzy {
                positions: vec![0, 4]
            }
            .to_string(),
            "fuzzy, 2 letters off"
        );
    }
}
