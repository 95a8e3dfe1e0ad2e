use std::fmt;

use exam_core::model::{
    OptionId, OptionView, QuestionBankId, QuestionId, QuestionType, QuestionWithOptions,
};
use storage::repository::Storage;

/// Question ids are namespaced per bank so several banks can share one database.
const QUESTION_IDS_PER_BANK: u64 = 100_000;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    bank_id: QuestionBankId,
    bank_name: String,
    questions: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidBankId { raw: String },
    InvalidQuestions { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBankId { raw } => write!(f, "invalid --bank-id value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
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
            std::env::var("EXAM_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3?mode=rwc".into());
        let mut bank_id = std::env::var("EXAM_BANK_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| QuestionBankId::new(1), QuestionBankId::new);
        let mut bank_name =
            std::env::var("EXAM_BANK_NAME").unwrap_or_else(|_| "Arithmetic".into());
        let mut questions = std::env::var("EXAM_QUESTIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(10);

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
                "--bank-id" => {
                    let value = require_value(&mut args, "--bank-id")?;
                    bank_id = value
                        .parse::<QuestionBankId>()
                        .map_err(|_| ArgsError::InvalidBankId { raw: value.clone() })?;
                }
                "--bank-name" => {
                    bank_name = require_value(&mut args, "--bank-name")?;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidQuestions { raw: value.clone() })?;
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
            bank_id,
            bank_name,
            questions,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3?mode=rwc)");
    eprintln!("  --bank-id <id>            Question bank id to upsert (default: 1)");
    eprintln!("  --bank-name <name>        Bank name (default: Arithmetic)");
    eprintln!("  --questions <n>           Number of sample questions to upsert (default: 10)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  EXAM_DB_URL, EXAM_BANK_ID, EXAM_BANK_NAME, EXAM_QUESTIONS");
}

fn option(id: u64, content: impl Into<String>, is_correct: bool) -> OptionView {
    OptionView {
        option_id: OptionId::new(id),
        content: content.into(),
        is_correct,
    }
}

/// Rotates through the three question shapes so every type shows up.
fn sample_question(question_id: QuestionId, n: u64) -> QuestionWithOptions {
    let (a, b) = (n + 2, n * 3 + 1);
    match n % 3 {
        0 => {
            let sum = a + b;
            QuestionWithOptions {
                question_id,
                content: format!("What is {a} + {b}?"),
                question_type: QuestionType::SingleChoice,
                options: vec![
                    option(1, (sum - 1).to_string(), false),
                    option(2, sum.to_string(), true),
                    option(3, (sum + 1).to_string(), false),
                    option(4, (sum + 10).to_string(), false),
                ],
            }
        }
        1 => QuestionWithOptions {
            question_id,
            content: format!("Which of these divide {}?", a * 6),
            question_type: QuestionType::MultipleChoice,
            options: vec![
                option(1, "2", true),
                option(2, "3", true),
                option(3, (a * 6 + 1).to_string(), false),
            ],
        },
        _ => QuestionWithOptions {
            question_id,
            content: format!("{a} * {b} = {}", a * b),
            question_type: QuestionType::TrueFalse,
            options: vec![option(1, "true", true), option(2, "false", false)],
        },
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    storage
        .banks
        .upsert_bank(args.bank_id, &args.bank_name)
        .await?;

    let base = args.bank_id.value().saturating_mul(QUESTION_IDS_PER_BANK);
    for i in 0..u64::from(args.questions) {
        let question = sample_question(QuestionId::new(base + i + 1), i);
        storage.banks.upsert_question(args.bank_id, &question).await?;
    }

    println!(
        "Seeded bank {} ({}) with {} questions into {}",
        args.bank_id, args.bank_name, args.questions, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
