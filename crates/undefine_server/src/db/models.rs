//! Database models and domain conversions.

use chrono::{NaiveDate, NaiveDateTime};
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use undefine_game::{ClueError, ClueRecord, Equivalents, ScoreSummary, WordClues};

use crate::db::schema;

/// A word with its clues.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::words)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Word {
    id: i32,
    word: String,
    definition: String,
    etymology: Option<String>,
    first_letter: String,
    in_a_sentence: Option<String>,
    number_of_letters: i32,
    equivalents: Option<String>,
    difficulty: String,
    times_used: i32,
    last_used_at: Option<NaiveDateTime>,
    daily_date: Option<NaiveDate>,
}

impl Word {
    /// Builds the validated clue set for this word.
    ///
    /// # Errors
    ///
    /// Returns [`ClueError`] if the definition or letter count is missing.
    #[instrument(skip(self), fields(word_id = self.id))]
    pub fn clues(&self) -> Result<WordClues, ClueError> {
        WordClues::try_from(ClueRecord {
            definition: Some(self.definition.clone()),
            etymology: self.etymology.clone(),
            first_letter: Some(self.first_letter.clone()),
            in_a_sentence: self.in_a_sentence.clone(),
            number_of_letters: u32::try_from(self.number_of_letters).ok(),
            equivalents: self.equivalents.clone().map(Equivalents::Joined),
        })
    }
}

/// Insertable word.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::words)]
pub struct NewWord {
    word: String,
    definition: String,
    etymology: Option<String>,
    first_letter: String,
    in_a_sentence: Option<String>,
    number_of_letters: i32,
    equivalents: Option<String>,
    difficulty: String,
}

/// A word as it appears in a seed file.
///
/// Letter count and first letter are derived from the word when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct WordSeed {
    /// The word itself.
    pub word: String,
    /// `D`
    pub definition: String,
    /// `E`
    #[serde(default)]
    pub etymology: Option<String>,
    /// `F`
    #[serde(default)]
    pub first_letter: Option<String>,
    /// `I`
    #[serde(default)]
    pub in_a_sentence: Option<String>,
    /// `N`
    #[serde(default)]
    pub number_of_letters: Option<i32>,
    /// `E2`
    #[serde(default)]
    pub equivalents: Option<Equivalents>,
    /// Easy, Medium or Hard.
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_difficulty() -> String {
    "Medium".to_string()
}

impl From<WordSeed> for NewWord {
    fn from(seed: WordSeed) -> Self {
        let word = seed.word.trim().to_string();
        let first_letter = seed
            .first_letter
            .unwrap_or_else(|| word.chars().take(1).collect());
        let number_of_letters = seed
            .number_of_letters
            .unwrap_or_else(|| i32::try_from(word.chars().count()).unwrap_or(i32::MAX));
        let equivalents = seed
            .equivalents
            .map(|e| e.into_list().join(","))
            .filter(|joined| !joined.is_empty());

        NewWord::new(
            word,
            seed.definition,
            seed.etymology,
            first_letter,
            seed.in_a_sentence,
            number_of_letters,
            equivalents,
            seed.difficulty,
        )
    }
}

/// A persisted session, serialized as JSON in `state`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters, new)]
#[diesel(table_name = schema::game_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SessionRow {
    id: String,
    username: String,
    word_id: i32,
    state: String,
    version: i64,
    updated_at: NaiveDateTime,
}

/// Aggregate statistics for one player.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Getters, Serialize,
)]
#[diesel(table_name = schema::user_stats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    username: String,
    games_played: i32,
    games_won: i32,
    average_guesses: f64,
    average_time: f64,
    current_streak: i32,
    longest_streak: i32,
    last_played_at: NaiveDateTime,
}

impl UserStats {
    /// Folds one completed game into the previous aggregate.
    ///
    /// Averages are running means over all games played. A win extends the
    /// current streak; a loss resets it.
    #[instrument(skip(previous, summary))]
    pub fn fold(
        username: &str,
        previous: Option<&UserStats>,
        summary: &ScoreSummary,
        now: NaiveDateTime,
    ) -> Self {
        let won = summary.won();
        let guesses = *summary.guesses_used() as f64;
        let seconds = summary.elapsed_seconds() as f64;

        let (played, wins, avg_guesses, avg_time, streak, longest) = match previous {
            Some(p) => (
                p.games_played,
                p.games_won,
                p.average_guesses,
                p.average_time,
                p.current_streak,
                p.longest_streak,
            ),
            None => (0, 0, 0.0, 0.0, 0, 0),
        };

        let current_streak = if won { streak + 1 } else { 0 };
        let n = f64::from(played);

        Self {
            username: username.to_string(),
            games_played: played + 1,
            games_won: wins + i32::from(won),
            average_guesses: (avg_guesses * n + guesses) / (n + 1.0),
            average_time: (avg_time * n + seconds) / (n + 1.0),
            current_streak,
            longest_streak: longest.max(current_streak),
            last_played_at: now,
        }
    }

    /// Win rate as a percentage (0.0-100.0).
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            f64::from(self.games_won) / f64::from(self.games_played) * 100.0
        }
    }
}

/// One completed game, as recorded for history.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::game_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    id: i32,
    username: String,
    word_id: i32,
    session_id: String,
    won: bool,
    guesses_used: i32,
    hints_used: i32,
    fuzzy_matches: i32,
    time_taken_seconds: i64,
    played_at: NaiveDateTime,
}

/// Insertable game result.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::game_results)]
pub(crate) struct NewGameResult {
    username: String,
    word_id: i32,
    session_id: String,
    won: bool,
    guesses_used: i32,
    hints_used: i32,
    fuzzy_matches: i32,
    time_taken_seconds: i64,
    played_at: NaiveDateTime,
}

impl NewGameResult {
    /// Builds a result row from a score summary.
    pub(crate) fn from_summary(
        username: &str,
        word_id: i32,
        summary: &ScoreSummary,
        now: NaiveDateTime,
    ) -> Self {
        let count = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
        Self::new(
            username.to_string(),
            word_id,
            summary.session_id().clone(),
            summary.won(),
            count(*summary.guesses_used()),
            count(*summary.hints_used()),
            count(*summary.fuzzy_matches()),
            summary.elapsed_seconds(),
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use undefine_game::{GameRules, GameSession};

    fn summary(target: &str, guesses: &[&str]) -> ScoreSummary {
        let clues = WordClues::try_from(ClueRecord {
            definition: Some("Test".to_string()),
            first_letter: Some("t".to_string()),
            number_of_letters: Some(4),
            ..ClueRecord::default()
        })
        .unwrap();
        let mut session =
            GameSession::new("game-s".to_string(), target, clues, GameRules::default());
        for guess in guesses {
            session.submit_guess(guess).unwrap();
        }
        session.score().unwrap()
    }

    fn now() -> NaiveDateTime {
        chrono::Utc::now().naive_utc()
    }

    #[test]
    fn test_first_game_starts_aggregate() {
        let stats = UserStats::fold("ada", None, &summary("test", &["tent", "test"]), now());
        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.games_won, 1);
        assert_eq!(stats.average_guesses, 2.0);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 1);
    }

    #[test]
    fn test_loss_resets_streak_but_keeps_longest() {
        let first = UserStats::fold("ada", None, &summary("test", &["test"]), now());
        let second = UserStats::fold("ada", Some(&first), &summary("test", &["test"]), now());
        assert_eq!(second.current_streak, 2);

        let lost = summary("test", &["a", "b", "c", "d", "e", "f"]);
        let third = UserStats::fold("ada", Some(&second), &lost, now());
        assert_eq!(third.current_streak, 0);
        assert_eq!(third.longest_streak, 2);
        assert_eq!(third.games_played, 3);
        assert_eq!(third.games_won, 2);
        assert!((third.average_guesses - 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_word_clues_from_row_fields() {
        let seed = WordSeed {
            word: "define".to_string(),
            definition: "To state the meaning".to_string(),
            etymology: None,
            first_letter: None,
            in_a_sentence: None,
            number_of_letters: None,
            equivalents: Some(Equivalents::List(vec!["explain".to_string()])),
            difficulty: default_difficulty(),
        };
        let new_word = NewWord::from(seed);
        assert_eq!(new_word.first_letter(), "d");
        assert_eq!(*new_word.number_of_letters(), 6);
        assert_eq!(new_word.equivalents().as_deref(), Some("explain"));
    }
}
