//! Tunable policy for test sessions.

use std::time::Duration as StdDuration;

use chrono::Duration;

pub const DEFAULT_MINUTES_PER_QUESTION: u32 = 2;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SWEEP_GRACE_SECS: u64 = 600;

/// Time limits and sweeper cadence for test sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestPolicy {
    minutes_per_question: u32,
    sweep_interval: StdDuration,
    sweep_grace: Duration,
}

impl Default for TestPolicy {
    fn default() -> Self {
        Self {
            minutes_per_question: DEFAULT_MINUTES_PER_QUESTION,
            sweep_interval: StdDuration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            sweep_grace: secs(DEFAULT_SWEEP_GRACE_SECS),
        }
    }
}

fn secs(value: u64) -> Duration {
    i64::try_from(value)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

impl TestPolicy {
    /// Reads `EXAM_MINUTES_PER_QUESTION`, `EXAM_SWEEP_INTERVAL_SECS` and
    /// `EXAM_SWEEP_GRACE_SECS`. Missing, unparsable or zero values keep the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`TestPolicy::from_env`] with an injectable variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
        };

        let mut policy = Self::default();
        if let Some(minutes) = read("EXAM_MINUTES_PER_QUESTION").and_then(|v| u32::try_from(v).ok())
        {
            policy.minutes_per_question = minutes;
        }
        if let Some(interval) = read("EXAM_SWEEP_INTERVAL_SECS") {
            policy.sweep_interval = StdDuration::from_secs(interval);
        }
        if let Some(grace) = read("EXAM_SWEEP_GRACE_SECS") {
            policy.sweep_grace = secs(grace);
        }
        policy
    }

    /// Zero is ignored; a test always gets some time per question.
    #[must_use]
    pub fn with_minutes_per_question(mut self, minutes: u32) -> Self {
        if minutes > 0 {
            self.minutes_per_question = minutes;
        }
        self
    }

    /// Zero is ignored; the sweeper needs a non-zero period.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: StdDuration) -> Self {
        if !interval.is_zero() {
            self.sweep_interval = interval;
        }
        self
    }

    #[must_use]
    pub fn with_sweep_grace(mut self, grace: Duration) -> Self {
        self.sweep_grace = grace;
        self
    }

    #[must_use]
    pub fn minutes_per_question(&self) -> u32 {
        self.minutes_per_question
    }

    #[must_use]
    pub fn sweep_interval(&self) -> StdDuration {
        self.sweep_interval
    }

    #[must_use]
    pub fn sweep_grace(&self) -> Duration {
        self.sweep_grace
    }

    /// Total time allowed for a test of `questions` questions.
    #[must_use]
    pub fn session_duration(&self, questions: u64) -> Duration {
        let minutes = questions.saturating_mul(u64::from(self.minutes_per_question));
        i64::try_from(minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .unwrap_or(Duration::MAX)
    }
}
