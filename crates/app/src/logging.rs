//! Tracing setup for the exam server.
//!
//! Filter directives come from `EXAM_LOG` and default to `info`. Output goes
//! to stderr because stdout carries the response stream.
//!
//! ```bash
//! EXAM_LOG=services=debug,warn cargo run -p app -- serve
//! ```

use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "EXAM_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Call once at startup.
pub fn init() {
    // A second init (e.g. from a test harness) keeps the first subscriber.
    let _ = fmt()
        .with_env_filter(filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
