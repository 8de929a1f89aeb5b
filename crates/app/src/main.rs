use std::fmt;
use std::sync::Arc;

use quiz_core::model::{ChoiceIndex, QuizRules, UserId};
use quiz_core::quiz::{QuizEvent, TimerUrgency};
use services::{
    AppServices, Clock, DashboardOverview, PersistenceStatus, QuizEventSink, StaticUser,
    TracingSink, run_quiz,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt as log_fmt};

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const CURRENCY: &str = "FCFA";

fn format_amount(amount: i64) -> String {
    format!("{amount} {CURRENCY}")
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    user_id: Option<UserId>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play    [--db <sqlite_url>] [--user <uuid>]");
    eprintln!("  cargo run -p app -- history [--db <sqlite_url>] [--user <uuid>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_USER_ID, RUST_LOG");
    eprintln!();
    eprintln!("Seed a database first with: cargo run -p storage --bin seed");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

impl Args {
    fn from_env() -> Self {
        let db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let user_id = std::env::var("QUIZ_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok());
        Self { db_url, user_id }
    }

    fn parse(mut self, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    self.db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    let parsed = value
                        .parse::<UserId>()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    self.user_id = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(self)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Prints quiz events to stdout and mirrors them to the log.
struct ConsoleSink;

impl QuizEventSink for ConsoleSink {
    fn emit(&self, event: &QuizEvent) {
        TracingSink.emit(event);
        match event {
            QuizEvent::QuestionChanged {
                index,
                total,
                question,
                seconds_left,
            } => {
                println!();
                println!("Question {}/{total} ({seconds_left}s)", index + 1);
                println!("  {}", question.prompt());
                for choice in ChoiceIndex::all() {
                    println!("  {choice}. {}", question.choice(choice));
                }
            }
            QuizEvent::TimerTicked {
                seconds_left,
                urgency,
            } => match urgency {
                TimerUrgency::Calm => {}
                TimerUrgency::Warning if *seconds_left == 10 => {
                    println!("  {seconds_left}s left");
                }
                TimerUrgency::Warning => {}
                TimerUrgency::Danger => println!("  {seconds_left}s!"),
            },
            QuizEvent::AnswerResolved {
                correct,
                correct_choice,
                score,
                ..
            } => {
                if *correct {
                    println!("  Correct! Score: {score}");
                } else {
                    println!("  Wrong, the answer was {correct_choice}. Score: {score}");
                }
            }
            QuizEvent::TimedOut { correct_choice, .. } => {
                println!("  Time is up, the answer was {correct_choice}.");
            }
            QuizEvent::SessionFinished { score, total, gain } => {
                println!();
                println!("Finished: {score}/{total}, you earned {}.", format_amount(*gain));
            }
        }
    }
}

/// Forward `1`..`4` typed on stdin as answers until stdin closes.
fn spawn_stdin_answers() -> mpsc::Receiver<ChoiceIndex> {
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let parsed = line
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(|n| ChoiceIndex::new(n).ok());
            match parsed {
                Some(choice) => {
                    if tx.send(choice).await.is_err() {
                        break;
                    }
                }
                None => eprintln!("type a number between 1 and 4"),
            }
        }
    });
    rx
}

async fn play(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = services.quiz_sessions();
    let mut session = quiz.begin().await?;
    let mut answers = spawn_stdin_answers();

    if run_quiz(&mut session, &mut answers, &ConsoleSink)
        .await
        .is_none()
    {
        warn!("quiz ended before it started");
        return Ok(());
    }

    let report = quiz.finish(&mut session).await?;
    match &report.persistence {
        PersistenceStatus::Saved { game_id } => {
            info!(game = %game_id, "result saved");
            println!("New balance: {}", format_amount(report.update.balance));
        }
        PersistenceStatus::ProfileFailed { reason } => {
            eprintln!("warning: your result could not be saved ({reason})");
        }
        PersistenceStatus::RecordFailed { reason } => {
            println!("New balance: {}", format_amount(report.update.balance));
            eprintln!("warning: this game is missing from your history ({reason})");
        }
    }

    // stdin reader may still be blocked on a read
    std::process::exit(0);
}

fn print_overview(overview: &DashboardOverview) {
    println!("{} ({})", overview.profile.pseudo(), overview.profile.id());
    println!("Balance: {}", format_amount(overview.profile.balance()));
    println!(
        "Games today: {}/{}{}",
        overview.games_played_today,
        overview.daily_limit,
        if overview.can_play {
            ""
        } else {
            " (come back tomorrow)"
        }
    );

    if overview.recent_games.is_empty() {
        println!("No games yet.");
        return;
    }
    println!();
    println!("Recent games:");
    for game in &overview.recent_games {
        println!(
            "  {}  score {:>2}  +{}",
            game.played_at().format("%Y-%m-%d %H:%M"),
            game.score(),
            format_amount(game.gain())
        );
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::from_env().parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup.
    prepare_sqlite_file(&parsed.db_url)?;
    let auth = match parsed.user_id {
        Some(user) => StaticUser::signed_in(user),
        None => StaticUser::anonymous(),
    };
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let services = AppServices::from_storage(
        &storage,
        Clock::default_clock(),
        QuizRules::default(),
        Arc::new(auth),
    );

    match cmd {
        Command::Play => play(&services).await,
        Command::History => {
            let user = parsed
                .user_id
                .ok_or_else(|| ArgsError::MissingValue { flag: "--user" })?;
            let overview = services.dashboard().overview(user).await?;
            print_overview(&overview);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    log_fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
