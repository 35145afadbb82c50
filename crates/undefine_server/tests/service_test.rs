//! Tests for the game service over a real database.

use chrono::TimeDelta;
use std::sync::Arc;
use tempfile::NamedTempFile;

use undefine_game::{GameRules, SessionError};
use undefine_server::{
    GameRepository, GameService, InMemorySessionStore, NewWord, ServiceError, SessionStore,
    StoreError, WordSelection,
};

struct Fixture {
    _db: NamedTempFile,
    service: GameService,
    store: InMemorySessionStore,
    word_id: i32,
}

fn setup() -> Fixture {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let repo = GameRepository::new(db_path).expect("Failed to create repository");
    repo.run_migrations().expect("Migrations failed");
    let word = repo
        .insert_word(NewWord::new(
            "define".to_string(),
            "To state the meaning of".to_string(),
            Some("From Latin definire".to_string()),
            "d".to_string(),
            None,
            6,
            Some("explain, specify".to_string()),
            "Medium".to_string(),
        ))
        .expect("Insert failed");

    let store = InMemorySessionStore::new();
    let service = GameService::new(
        Arc::new(store.clone()),
        repo,
        GameRules::default(),
        TimeDelta::hours(24),
    );
    Fixture {
        _db: db_file,
        service,
        store,
        word_id: *word.id(),
    }
}

#[test]
fn test_start_game_reveals_definition() {
    let f = setup();
    let started = f
        .service
        .start_game("ada", WordSelection::Daily)
        .expect("Start failed");

    assert!(started.session_id().starts_with("game-"));
    assert_eq!(started.definition(), "To state the meaning of");
    assert_eq!(started.revealed_hints(), &[0]);
    assert_eq!(*started.max_guesses(), 6);

    let view = f.service.session_view(started.session_id()).expect("View failed");
    assert_eq!(view.username(), "ada");
    assert_eq!(view.clues().len(), 1);
    assert!(view.target_word().is_none());
    assert!(view.score().is_none());
}

#[test]
fn test_start_game_selections() {
    let f = setup();
    f.service
        .start_game("ada", WordSelection::Random)
        .expect("Random start failed");
    f.service
        .start_game("ada", WordSelection::Word(f.word_id))
        .expect("Word start failed");

    let missing = f.service.start_game("ada", WordSelection::Word(9999));
    assert!(matches!(missing, Err(ServiceError::WordNotFound(9999))));

    let blank = f.service.start_game("  ", WordSelection::Daily);
    assert!(matches!(blank, Err(ServiceError::InvalidUsername)));
}

#[test]
fn test_reveal_hint_reports_text_and_is_idempotent() {
    let f = setup();
    let id = f
        .service
        .start_game("ada", WordSelection::Daily)
        .expect("Start failed")
        .session_id()
        .clone();

    let hint = f.service.reveal_hint(&id, 1).expect("Reveal failed");
    assert_eq!(hint.code().to_string(), "E2");
    assert_eq!(hint.text().as_deref(), Some("explain, specify"));
    assert!(*hint.newly_revealed());
    assert_eq!(hint.revealed_hints(), &[0, 1]);

    let again = f.service.reveal_hint(&id, 1).expect("Reveal failed");
    assert!(!*again.newly_revealed());
    assert_eq!(again.revealed_hints(), &[0, 1]);

    let sentence = f.service.reveal_hint(&id, 3).expect("Reveal failed");
    assert!(sentence.text().is_none());

    let bad = f.service.reveal_hint(&id, 6);
    assert!(matches!(
        bad,
        Err(ServiceError::Session(SessionError::InvalidHintSlot(6)))
    ));
}

#[test]
fn test_winning_guess_records_stats() {
    let f = setup();
    let id = f
        .service
        .start_game("ada", WordSelection::Daily)
        .expect("Start failed")
        .session_id()
        .clone();

    let fuzzy = f.service.submit_guess(&id, "defint").expect("Guess failed");
    assert!(!*fuzzy.is_correct());
    assert!(*fuzzy.is_fuzzy());
    assert_eq!(fuzzy.fuzzy_positions(), &[5]);
    assert!(!*fuzzy.game_over());
    assert_eq!(*fuzzy.remaining_guesses(), 5);

    let win = f.service.submit_guess(&id, "DEFINE").expect("Guess failed");
    assert!(*win.is_correct());
    assert!(*win.game_over());
    assert!(win.correct_word().is_none());

    let stats = f.service.user_stats("ada").expect("Stats missing");
    assert_eq!(*stats.games_played(), 1);
    assert_eq!(*stats.games_won(), 1);
    assert_eq!(*stats.average_guesses(), 2.0);

    let word = f
        .service
        .repository()
        .fetch_word(f.word_id)
        .expect("Query failed")
        .expect("Word exists");
    assert_eq!(*word.times_used(), 1);

    let view = f.service.session_view(&id).expect("View failed");
    assert_eq!(view.target_word().as_deref(), Some("define"));
    assert_eq!(view.score().as_ref().map(|s| *s.fuzzy_matches()), Some(1));
}

#[test]
fn test_losing_reveals_word_and_rejects_more_guesses() {
    let f = setup();
    let id = f
        .service
        .start_game("ada", WordSelection::Daily)
        .expect("Start failed")
        .session_id()
        .clone();

    let mut last = None;
    for guess in ["apple", "mango", "chair", "table", "grape", "zebra"] {
        last = Some(f.service.submit_guess(&id, guess).expect("Guess failed"));
    }
    let last = last.expect("Six guesses made");
    assert!(*last.game_over());
    assert_eq!(last.correct_word().as_deref(), Some("define"));
    assert_eq!(*last.remaining_guesses(), 0);

    let closed = f.service.submit_guess(&id, "define");
    assert!(matches!(
        closed,
        Err(ServiceError::Session(SessionError::SessionClosed))
    ));

    let stats = f.service.user_stats("ada").expect("Stats missing");
    assert_eq!(*stats.games_won(), 0);
    assert_eq!(*stats.current_streak(), 0);
}

#[test]
fn test_blank_guess_rejected_without_write() {
    let f = setup();
    let id = f
        .service
        .start_game("ada", WordSelection::Daily)
        .expect("Start failed")
        .session_id()
        .clone();
    let before = f.store.load(&id).expect("Load failed").expect("Exists");

    let result = f.service.submit_guess(&id, "   ");
    assert!(matches!(
        result,
        Err(ServiceError::Session(SessionError::InvalidGuess))
    ));

    let after = f.store.load(&id).expect("Load failed").expect("Exists");
    assert_eq!(before, after);
}

#[test]
fn test_unknown_session_and_player() {
    let f = setup();
    assert!(matches!(
        f.service.submit_guess("game-missing", "define"),
        Err(ServiceError::SessionNotFound(_))
    ));
    assert!(matches!(
        f.service.session_view("game-missing"),
        Err(ServiceError::SessionNotFound(_))
    ));
    assert!(matches!(
        f.service.user_stats("nobody"),
        Err(ServiceError::PlayerNotFound(_))
    ));
}

#[test]
fn test_concurrent_writer_is_detected() {
    let f = setup();
    let id = f
        .service
        .start_game("ada", WordSelection::Daily)
        .expect("Start failed")
        .session_id()
        .clone();

    let mut stale = f.store.load(&id).expect("Load failed").expect("Exists");
    f.service.submit_guess(&id, "refine").expect("Guess failed");

    stale.session_mut().submit_guess("define").expect("Guess accepted");
    assert!(matches!(f.store.save(stale), Err(StoreError::Stale { .. })));

    let view = f.service.session_view(&id).expect("View failed");
    assert_eq!(view.guesses().len(), 1);
}

#[test]
fn test_purge_keeps_fresh_sessions() {
    let f = setup();
    f.service
        .start_game("ada", WordSelection::Daily)
        .expect("Start failed");
    assert_eq!(f.service.purge_idle().expect("Purge failed"), 0);
    assert_eq!(f.store.list().expect("List failed").len(), 1);
}
