use std::fmt;

use quiz_core::model::{ChoiceIndex, Profile, Question, QuestionId, UserId};
use storage::repository::{StorageError, Storage};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt as log_fmt};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    pseudo: String,
    phone: Option<String>,
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite://quiz.sqlite3?mode=rwc".into());
        let mut user_id = std::env::var("QUIZ_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or_else(UserId::random);
        let mut pseudo = std::env::var("QUIZ_PSEUDO").unwrap_or_else(|_| "joueur".into());
        let mut phone = std::env::var("QUIZ_PHONE").ok();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--pseudo" => {
                    pseudo = require_value(&mut args, "--pseudo")?;
                }
                "--phone" => {
                    phone = Some(require_value(&mut args, "--phone")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            pseudo,
            phone,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>    SQLite URL (default: sqlite://quiz.sqlite3?mode=rwc)");
    eprintln!("  --user <uuid>        Profile id to create (default: random)");
    eprintln!("  --pseudo <name>      Display name (default: joueur)");
    eprintln!("  --phone <number>     Optional phone number");
    eprintln!("  -h, --help           Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_USER_ID, QUIZ_PSEUDO, QUIZ_PHONE");
}

const SAMPLE_QUESTIONS: [(&str, [&str; 4], u8); 12] = [
    ("Capital of Senegal?", ["Dakar", "Thies", "Saint-Louis", "Ziguinchor"], 1),
    ("Largest ocean on Earth?", ["Atlantic", "Indian", "Pacific", "Arctic"], 3),
    ("How many continents are there?", ["5", "6", "7", "8"], 3),
    ("Chemical symbol for gold?", ["Ag", "Au", "Gd", "Go"], 2),
    ("Longest river in Africa?", ["Congo", "Niger", "Zambezi", "Nile"], 4),
    ("Which planet is known as the red planet?", ["Venus", "Mars", "Jupiter", "Mercury"], 2),
    ("How many minutes are in a day?", ["1440", "1240", "1400", "3600"], 1),
    ("Currency used in Cote d'Ivoire?", ["Naira", "Cedi", "FCFA", "Dirham"], 3),
    ("Boiling point of water at sea level (C)?", ["90", "100", "110", "120"], 2),
    ("Author of 'Une si longue lettre'?", ["Mariama Ba", "Aminata Sow Fall", "Ken Bugul", "Fatou Diome"], 1),
    ("Smallest prime number?", ["0", "1", "2", "3"], 3),
    ("Highest mountain in Africa?", ["Mount Kenya", "Kilimanjaro", "Ruwenzori", "Mount Cameroon"], 2),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    for (i, (prompt, choices, correct)) in SAMPLE_QUESTIONS.iter().enumerate() {
        let question = Question::new(
            QuestionId::new(u64::try_from(i)? + 1),
            *prompt,
            choices.map(str::to_string),
            ChoiceIndex::new(*correct)?,
        )?;
        storage.questions.upsert_question(&question).await?;
    }
    info!(count = SAMPLE_QUESTIONS.len(), "seeded question pool");

    match storage.profiles.get_profile(args.user_id).await {
        Ok(existing) => info!(user = %existing.id(), "profile already present"),
        Err(StorageError::NotFound) => {
            let profile = Profile::new(args.user_id, args.pseudo.clone(), args.phone.clone())?;
            storage.profiles.upsert_profile(&profile).await?;
            info!(user = %profile.id(), "created profile");
        }
        Err(e) => return Err(e.into()),
    }

    println!(
        "Seeded {} questions and profile {} into {}",
        SAMPLE_QUESTIONS.len(),
        args.user_id,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    log_fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
