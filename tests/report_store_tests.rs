
use std::fs;

use quiz_assistant::session::{ScriptedInput, SessionResult, SessionRunner};
use quiz_assistant::{QuizError, ReportStore};
use tempfile::tempdir;
use test_utils::{fixed_clock, sample_quiz};

fn store_in(dir: &std::path::Path) -> ReportStore {
    ReportStore::new(dir.join("quiz.json"), dir.join("report.csv"))
}

#[test]
fn header_is_written_once() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    for (score, seed) in [(3, 42), (5, 7), (0, 1)] {
        store.append(&SessionResult::new(fixed_clock(), "Fractions", score, 5, seed)).unwrap();
    }

    let text = fs::read_to_string(store.report_path()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "Date,Topic,Score,Total,Seed",
            "2024-09-02 08:30,Fractions,3,5,42",
            "2024-09-02 08:30,Fractions,5,5,7",
            "2024-09-02 08:30,Fractions,0,5,1",
        ]
    );
}

#[test]
fn empty_existing_log_gets_a_header() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    fs::write(store.report_path(), "").unwrap();

    store.append(&SessionResult::new(fixed_clock(), "t", 1, 3, 42)).unwrap();

    let text = fs::read_to_string(store.report_path()).unwrap();
    assert!(text.starts_with("Date,Topic,Score,Total,Seed\n"));
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn topics_with_commas_are_quoted_and_read_back() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    store.append(&SessionResult::new(fixed_clock(), "Дроби, часть 1", 2, 3, 42)).unwrap();

    let text = fs::read_to_string(store.report_path()).unwrap();
    assert!(text.contains("\"Дроби, часть 1\""));

    let rows = store.history().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].topic, "Дроби, часть 1");
    assert_eq!(rows[0].date, "2024-09-02 08:30");
    assert_eq!((rows[0].score, rows[0].total, rows[0].seed), (2, 3, 42));
}

#[test]
fn history_of_missing_log_is_empty() {
    let dir = tempdir().unwrap();
    assert!(store_in(dir.path()).history().unwrap().is_empty());
}

#[test]
fn snapshot_overwrites_and_keeps_non_ascii() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    let mut quiz = sample_quiz();
    store.snapshot(&quiz).unwrap();
    quiz.topic = "Дроби".to_string();
    store.snapshot(&quiz).unwrap();

    let text = fs::read_to_string(store.snapshot_path()).unwrap();
    assert!(text.contains("\"topic\": \"Дроби\""));
    assert!(!text.contains("\\u"));
    assert!(text.contains("\n  \"items\": ["));
    assert_eq!(store.load_snapshot().unwrap(), quiz);
}

#[test]
fn malformed_quiz_leaves_files_untouched() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    let good = sample_quiz();
    store.snapshot(&good).unwrap();
    store.append(&SessionResult::new(fixed_clock(), "Fractions", 3, 5, 42)).unwrap();
    let snapshot_before = fs::read(store.snapshot_path()).unwrap();
    let report_before = fs::read(store.report_path()).unwrap();

    let mut bad = sample_quiz();
    bad.items[0].options = None;

    let mut runner = SessionRunner::new(ScriptedInput::new(["3/4"; 5]), Vec::new());
    let outcome = runner.run_and_record(&bad, 42, &store, true);

    assert!(matches!(outcome, Err(QuizError::MalformedQuiz(_))));
    assert_eq!(fs::read(store.snapshot_path()).unwrap(), snapshot_before);
    assert_eq!(fs::read(store.report_path()).unwrap(), report_before);
}

#[test]
fn interrupted_session_writes_nothing() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    let mut runner = SessionRunner::new(ScriptedInput::new(["3/4", "0.5"]), Vec::new());
    let outcome = runner.run_and_record(&sample_quiz(), 42, &store, true);

    assert!(matches!(outcome, Err(QuizError::Interrupted)));
    assert!(!store.snapshot_path().exists());
    assert!(!store.report_path().exists());
}

#[test]
fn finished_session_saves_snapshot_and_row() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let quiz = sample_quiz();

    let mut runner = SessionRunner::new(ScriptedInput::new(["3/4", "0,5", "1/2", "NUMERATOR", "4/2"]), Vec::new())
        .with_clock(fixed_clock);
    let result = runner.run_and_record(&quiz, -5, &store, true).unwrap();

    assert_eq!(result.score(), 3);
    assert_eq!(store.load_snapshot().unwrap(), quiz);
    let rows = store.history().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].score, rows[0].total, rows[0].seed), (3, 5, -5));
}

#[test]
fn replayed_session_keeps_the_snapshot() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let saved = sample_quiz();
    store.snapshot(&saved).unwrap();

    let mut other = sample_quiz();
    other.topic = "Other".to_string();
    let mut runner = SessionRunner::new(ScriptedInput::new(["x"; 5]), Vec::new()).with_clock(fixed_clock);
    runner.run_and_record(&other, 42, &store, false).unwrap();

    assert_eq!(store.load_snapshot().unwrap(), saved);
    assert_eq!(store.history().unwrap()[0].topic, "Other");
}

#[test]
fn append_to_unwritable_path_is_an_io_error() {
    let dir = tempdir().unwrap();
    let store = ReportStore::new(dir.path().join("quiz.json"), dir.path().join("missing").join("report.csv"));
    let err = store.append(&SessionResult::new(fixed_clock(), "t", 1, 3, 42)).unwrap_err();
    assert!(matches!(err, QuizError::Io(_)), "{err}");
}
