use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use quiz_assistant::clients::{OpenAIClient, OpenAIModel};
use quiz_assistant::config::{AppConfig, KeyFromEnv};
use quiz_assistant::core::LowLevelClient;
use quiz_assistant::provider::LlmQuizProvider;
use quiz_assistant::session::{parse_seed, InputSource, StdinInput, DEFAULT_SEED};
use quiz_assistant::{DispatchOutcome, Dispatcher, Quiz, QuizError, ReportStore, SessionRunner};
use tracing::error;

#[derive(Parser)]
#[command(author, version, about = "Teacher's quiz assistant", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    OPENAI_API_KEY       API key (needed unless --replay or --history)
    OPENAI_MODEL         Model id [default: gpt-4o-mini]
    QUIZ_SNAPSHOT_PATH   Quiz snapshot file [default: quiz.json]
    QUIZ_REPORT_PATH     Score log [default: report.csv]
    RUST_LOG             Log filter, logs go to stderr [default: warn]

EXAMPLES:
    quiz-assistant                        # Ask for quizzes and take them
    quiz-assistant --seed 7               # Fixed option shuffling
    quiz-assistant --print-only           # Only print generated quizzes
    quiz-assistant --replay --seed 7      # Take the last saved quiz again
    quiz-assistant --history              # Show past scores")]
struct Args {
    /// Seed for option shuffling [default: asked per session, 42 if blank]
    #[arg(short, long, allow_negative_numbers = true)]
    seed: Option<i64>,

    /// Model id, overrides OPENAI_MODEL
    #[arg(short, long)]
    model: Option<String>,

    /// Quiz snapshot file, overrides QUIZ_SNAPSHOT_PATH
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Score log file, overrides QUIZ_REPORT_PATH
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print generated quizzes as JSON without running a session or saving anything
    #[arg(long, conflicts_with_all = ["replay", "history"])]
    print_only: bool,

    /// Run a session from the saved snapshot instead of asking the model
    #[arg(long, conflicts_with = "history")]
    replay: bool,

    /// Print the score log and exit
    #[arg(long)]
    history: bool,
}

impl Args {
    fn config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(model) = &self.model {
            config.model = OpenAIModel::from_id(model);
        }
        if let Some(path) = &self.snapshot {
            config.snapshot_path = path.clone();
        }
        if let Some(path) = &self.report {
            config.report_path = path.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    // Stdin is read on the main thread; the signal task runs on a worker.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nBye!");
            std::process::exit(0);
        }
    });

    let args = Args::parse();
    let config = args.config();
    let store = ReportStore::new(&config.snapshot_path, &config.report_path);
    let mut input = StdinInput::stdin();

    if args.history {
        return print_history(&store);
    }

    if args.replay {
        let quiz = store
            .load_snapshot()
            .with_context(|| format!("cannot load {}", store.snapshot_path().display()))?;
        println!("Replaying \"{}\" ({} questions)", quiz.topic, quiz.items.len());
        take_quiz(&mut input, &store, &quiz, args.seed, false)?;
        return Ok(());
    }

    let api_key = OpenAIClient::require_key()?;
    let client: Box<dyn LowLevelClient> = Box::new(OpenAIClient::new(config.openai_config(api_key)));
    let dispatcher = Dispatcher::new(client.clone(), LlmQuizProvider::new(client));

    println!("Example: \"Make a 5-question quiz on fractions for grades 4-6\"");
    loop {
        let Some(request) = input.read_line("> ")? else {
            println!("\nBye!");
            return Ok(());
        };
        if request.is_empty() {
            continue;
        }

        let (spec, quiz) = match dispatcher.handle(&request).await {
            Ok(DispatchOutcome::Quiz { spec, quiz }) => (spec, quiz),
            Ok(outcome) => {
                println!("{}", outcome.message().unwrap_or_default());
                continue;
            }
            Err(QuizError::Validation(e)) => {
                println!("Cannot build that quiz: {e}. Please rephrase the request.");
                continue;
            }
            Err(e) => {
                error!(error = %e, "Request failed");
                println!("Error: {e}");
                continue;
            }
        };

        if args.print_only {
            println!("{}", serde_json::to_string_pretty(&quiz)?);
            continue;
        }

        println!(
            "Quiz \"{}\" for grades {}: {} questions",
            quiz.topic,
            spec.grade_level,
            quiz.items.len()
        );
        if !take_quiz(&mut input, &store, &quiz, args.seed, true)? {
            println!("\nBye!");
            return Ok(());
        }
    }
}

/// Run one session and persist it. Returns `false` when input ran out.
fn take_quiz(
    input: &mut impl InputSource,
    store: &ReportStore,
    quiz: &Quiz,
    seed: Option<i64>,
    save_snapshot: bool,
) -> anyhow::Result<bool> {
    let seed = match seed {
        Some(seed) => seed,
        None => match input.read_line(&format!("Seed (default {DEFAULT_SEED}): "))? {
            Some(text) => parse_seed(&text),
            None => return Ok(false),
        },
    };

    let mut runner = SessionRunner::new(&mut *input, io::stdout());
    match runner.run_and_record(quiz, seed, store, save_snapshot) {
        Ok(_) => {
            println!("Saved to {}", store.report_path().display());
            Ok(true)
        }
        Err(QuizError::Interrupted) => Ok(false),
        Err(e @ QuizError::MalformedQuiz(_)) => {
            println!("Session aborted: {e}");
            Ok(true)
        }
        Err(e) => Err(e).with_context(|| {
            format!(
                "cannot save the session to {} and {}",
                store.snapshot_path().display(),
                store.report_path().display()
            )
        }),
    }
}

fn print_history(store: &ReportStore) -> anyhow::Result<()> {
    let rows = store.history()?;
    if rows.is_empty() {
        println!("No sessions recorded in {}", store.report_path().display());
        return Ok(());
    }
    for row in rows {
        println!("{}  {:<30} {:>2}/{:<2} seed {}", row.date, row.topic, row.score, row.total, row.seed);
    }
    Ok(())
}
