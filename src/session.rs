//! Interactive quiz sessions.
//!
//! A session walks the quiz items in stored order, shuffles the options of
//! every multiple-choice item with one seeded generator, asks for an answer
//! per item and counts the correct ones. The same quiz and seed always
//! produce the same option orderings.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use chrono::{Local, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::QuizError;
use crate::quiz::Quiz;
use crate::report::ReportStore;

/// Seed used when none, or an unparsable one, is given.
pub const DEFAULT_SEED: i64 = 42;

/// Parse a seed typed by the user; empty or invalid input yields [`DEFAULT_SEED`].
/// Negative seeds are valid.
pub fn parse_seed(input: &str) -> i64 {
    input.trim().parse().unwrap_or(DEFAULT_SEED)
}

/// Source of answers: one trimmed line per call, `None` once input is exhausted.
pub trait InputSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

impl<T: InputSource + ?Sized> InputSource for &mut T {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        (**self).read_line(prompt)
    }
}

/// Reads answers from a buffered reader (stdin in the CLI), echoing the
/// prompt to stdout first.
pub struct StdinInput<R> {
    reader: R,
}

impl StdinInput<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> StdinInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> InputSource for StdinInput<R> {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        // Bytes that are not UTF-8 are replaced rather than failing the read.
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
    }
}

/// Fixed answers, handed out in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { answers: answers.into_iter().map(Into::into).collect() }
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Ok(self.answers.pop_front().map(|answer| answer.trim().to_string()))
    }
}

/// Outcome of one finished session. Fields are read-only once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    timestamp: NaiveDateTime,
    topic: String,
    score: u32,
    total: u32,
    seed: i64,
}

impl SessionResult {
    pub fn new(timestamp: NaiveDateTime, topic: impl Into<String>, score: u32, total: u32, seed: i64) -> Self {
        Self { timestamp, topic: topic.into(), score, total, seed }
    }

    pub fn timestamp(&self) -> NaiveDateTime { self.timestamp }
    pub fn topic(&self) -> &str { &self.topic }
    pub fn score(&self) -> u32 { self.score }
    pub fn total(&self) -> u32 { self.total }
    pub fn seed(&self) -> i64 { self.seed }
}

/// What happened to a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub id: u32,
    /// Options in the order they were shown; `None` for short items.
    pub presented_options: Option<Vec<String>>,
    pub answer: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub result: SessionResult,
    pub items: Vec<ItemOutcome>,
}

/// Grade one answer.
///
/// Text matching is case-insensitive. For multiple choice, a number is also
/// accepted when it is a 1-based index into `presented_options` whose option
/// equals the canonical answer. Either check passing is enough.
pub fn is_correct(answer: &str, canonical: &str, presented_options: Option<&[String]>) -> bool {
    if answer.to_lowercase() == canonical.to_lowercase() {
        return true;
    }
    let Some(options) = presented_options else {
        return false;
    };
    answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| options.get(index))
        .is_some_and(|option| option == canonical)
}

pub struct SessionRunner<I, W> {
    input: I,
    out: W,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl<I: InputSource, W: Write> SessionRunner<I, W> {
    pub fn new(input: I, out: W) -> Self {
        Self { input, out, clock: local_now }
    }

    /// Replace the clock used to stamp results.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn into_parts(self) -> (I, W) {
        (self.input, self.out)
    }

    pub fn run(&mut self, quiz: &Quiz, seed: i64) -> Result<SessionResult, QuizError> {
        self.run_with_transcript(quiz, seed).map(|outcome| outcome.result)
    }

    /// Run a session and, only if it completes, save it to `store`: the
    /// snapshot first (when `save_snapshot` is set), then the report row.
    /// A malformed quiz or interrupted input leaves both files untouched.
    pub fn run_and_record(
        &mut self,
        quiz: &Quiz,
        seed: i64,
        store: &ReportStore,
        save_snapshot: bool,
    ) -> Result<SessionResult, QuizError> {
        let result = self.run(quiz, seed)?;
        store.record(quiz, &result, save_snapshot)?;
        Ok(result)
    }

    /// Run a full session, returning the result plus what was shown and
    /// answered for every item.
    ///
    /// The whole quiz is validated before the first question, so a malformed
    /// quiz fails without asking anything. Running out of input fails with
    /// [`QuizError::Interrupted`].
    #[instrument(skip(self, quiz), fields(topic = %quiz.topic, items = quiz.items.len()))]
    pub fn run_with_transcript(&mut self, quiz: &Quiz, seed: i64) -> Result<SessionOutcome, QuizError> {
        quiz.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        let mut score = 0u32;
        let mut outcomes = Vec::with_capacity(quiz.items.len());

        for (number, item) in quiz.items.iter().enumerate() {
            let canonical = quiz.canonical_answer(item)?;
            let presented = item.mcq_options()?.map(|options| {
                let mut shuffled = options.to_vec();
                shuffled.shuffle(&mut rng);
                shuffled
            });

            writeln!(self.out, "\n{}. {}", number + 1, item.question)?;
            if let Some(options) = &presented {
                for (i, option) in options.iter().enumerate() {
                    writeln!(self.out, "   {}) {}", i + 1, option)?;
                }
            }
            self.out.flush()?;

            let answer = self.input.read_line("Your answer: ")?.ok_or(QuizError::Interrupted)?;
            let correct = is_correct(&answer, canonical, presented.as_deref());
            if correct {
                score += 1;
                writeln!(self.out, "Correct!")?;
            } else {
                writeln!(self.out, "Wrong. Correct answer: {canonical}")?;
            }
            debug!(item = item.id, correct, "Answer graded");

            outcomes.push(ItemOutcome { id: item.id, presented_options: presented, answer, correct });
        }

        let total = quiz.items.len() as u32;
        let result = SessionResult::new((self.clock)(), quiz.topic.clone(), score, total, seed);
        writeln!(self.out, "\nScore: {score}/{total}")?;
        info!(score, total, seed, "Session finished");

        Ok(SessionOutcome { result, items: outcomes })
    }
}
