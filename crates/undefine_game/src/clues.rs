//! Clue categories and their fixed reveal order.
//!
//! Every target word carries six clues. Each clue category owns a slot
//! index, and the slot index is the order in which the UI offers hints.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::instrument;

/// Number of hint slots a word exposes.
pub const HINT_SLOT_COUNT: usize = 6;

/// A clue category, declared in reveal order.
///
/// The discriminant is the slot index. Iterating with
/// [`strum::IntoEnumIterator`] yields slots by increasing index.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[repr(u8)]
pub enum HintSlot {
    /// `D`: the definition (slot 0).
    #[display("Definition")]
    Definition = 0,
    /// `E2`: equivalents and synonyms (slot 1).
    #[display("Equivalents")]
    Equivalents = 1,
    /// `F`: the first letter (slot 2).
    #[display("First letter")]
    FirstLetter = 2,
    /// `I`: the word used in a sentence (slot 3).
    #[display("In a sentence")]
    InASentence = 3,
    /// `N`: the number of letters (slot 4).
    #[display("Number of letters")]
    NumberOfLetters = 4,
    /// `E`: the etymology (slot 5).
    #[display("Etymology")]
    Etymology = 5,
}

impl HintSlot {
    /// Returns the slot index (0-5).
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Returns the short category code used by clients (`D`, `E2`, ...).
    pub fn code(self) -> &'static str {
        match self {
            Self::Definition => "D",
            Self::Equivalents => "E2",
            Self::FirstLetter => "F",
            Self::InASentence => "I",
            Self::NumberOfLetters => "N",
            Self::Etymology => "E",
        }
    }

    /// Looks up a slot by category code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::iter().find(|slot| slot.code() == code)
    }

    /// Looks up a slot by index. Returns `None` outside 0-5.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::iter().find(|slot| slot.index() == index)
    }

    /// Returns the slot revealed after this one, if any.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }
}

impl TryFrom<u8> for HintSlot {
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or(index)
    }
}

/// Error building [`WordClues`] from a raw record.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ClueError {
    /// The definition (`D`) is missing or blank.
    #[display("Word clues require a definition")]
    MissingDefinition,
    /// The letter count (`N`) is missing or zero.
    #[display("Word clues require a positive letter count")]
    MissingLetterCount,
    /// The first letter (`F`) is missing or blank.
    #[display("Word clues require a first letter")]
    MissingFirstLetter,
}

/// Synonym list as it arrives from storage: either a list or one
/// comma-joined string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Equivalents {
    /// Already split.
    List(Vec<String>),
    /// Comma-joined, e.g. `"explain, specify"`.
    Joined(String),
}

impl Equivalents {
    /// Splits into trimmed, non-empty entries.
    pub fn into_list(self) -> Vec<String> {
        let raw = match self {
            Self::List(items) => items,
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Unvalidated clue fields, as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueRecord {
    /// `D`
    pub definition: Option<String>,
    /// `E`
    pub etymology: Option<String>,
    /// `F`
    pub first_letter: Option<String>,
    /// `I`
    pub in_a_sentence: Option<String>,
    /// `N`
    pub number_of_letters: Option<u32>,
    /// `E2`
    pub equivalents: Option<Equivalents>,
}

/// The six clues for one target word.
///
/// Definition, first letter and letter count are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct WordClues {
    definition: String,
    etymology: Option<String>,
    first_letter: char,
    in_a_sentence: Option<String>,
    number_of_letters: u32,
    equivalents: Vec<String>,
}

impl WordClues {
    /// Returns the clue text shown for `slot`, or `None` when the word has
    /// no clue in that category.
    #[instrument(skip(self))]
    pub fn reveal(&self, slot: HintSlot) -> Option<String> {
        match slot {
            HintSlot::Definition => Some(self.definition.clone()),
            HintSlot::Equivalents if self.equivalents.is_empty() => None,
            HintSlot::Equivalents => Some(self.equivalents.join(", ")),
            HintSlot::FirstLetter => Some(self.first_letter.to_uppercase().to_string()),
            HintSlot::InASentence => self.in_a_sentence.clone(),
            HintSlot::NumberOfLetters => Some(self.number_of_letters.to_string()),
            HintSlot::Etymology => self.etymology.clone(),
        }
    }
}

impl TryFrom<ClueRecord> for WordClues {
    type Error = ClueError;

    #[instrument(name = "word_clues_try_from")]
    fn try_from(record: ClueRecord) -> Result<Self, Self::Error> {
        let definition = non_blank(record.definition).ok_or(ClueError::MissingDefinition)?;
        let number_of_letters = record
            .number_of_letters
            .filter(|n| *n > 0)
            .ok_or(ClueError::MissingLetterCount)?;
        let first_letter = non_blank(record.first_letter)
            .and_then(|s| s.chars().next())
            .ok_or(ClueError::MissingFirstLetter)?;

        Ok(Self {
            definition,
            etymology: non_blank(record.etymology),
            first_letter,
            in_a_sentence: non_blank(record.in_a_sentence),
            number_of_letters,
            equivalents: record
                .equivalents
                .map(Equivalents::into_list)
                .unwrap_or_default(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
