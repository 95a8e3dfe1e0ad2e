mod logging;
mod protocol;

use std::fmt;

use services::{AppServices, Clock, TestPolicy};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
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

#[derive(Debug)]
struct Args {
    db_url: String,
    sweep: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- serve [--db <sqlite_url>] [--no-sweep]");
    eprintln!();
    eprintln!("Reads one JSON request per line on stdin and answers on stdout.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:exam.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_LOG, EXAM_MINUTES_PER_QUESTION,");
    eprintln!("  EXAM_SWEEP_INTERVAL_SECS, EXAM_SWEEP_GRACE_SECS");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAM_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:exam.sqlite3".into()), normalize_sqlite_url);
        let mut sweep = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--no-sweep" => sweep = false,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, sweep })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}?mode=rwc", absolute.display())
}

fn prepare_sqlite_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

async fn serve(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let tests = services.tests();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = protocol::handle_line(&tests, &line).await;
        stdout.write_all(response.to_line().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1).peekable();
    let first = argv.peek().cloned();

    match first.as_deref() {
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some("serve") => {
            argv.next();
        }
        Some(first) if !first.starts_with("--") => {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            return Err(ArgsError::UnknownArg(first.to_string()).into());
        }
        _ => {}
    }

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    logging::init();

    prepare_sqlite_dir(&args.db_url)?;
    let policy = TestPolicy::from_env();
    let services = AppServices::new_sqlite(&args.db_url, Clock::system(), policy).await?;
    tracing::info!(
        db = %args.db_url,
        minutes_per_question = policy.minutes_per_question(),
        sweep = args.sweep,
        "exam server ready"
    );

    let sweeper = args.sweep.then(|| services.spawn_sweeper());
    let outcome = serve(&services).await;
    if let Some(handle) = sweeper {
        handle.abort();
    }
    tracing::info!(open_sessions = services.sessions().len(), "input closed, shutting down");
    outcome
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
