use chrono::{DateTime, Duration, Utc};

/// Source of "now" for session creation and expiry checks.
///
/// Services take a `Clock` by value so tests can pin time and exercise expiry
/// without sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// A fixed clock moved forward by `delta`; a system clock is returned as is.
    #[must_use]
    pub fn advanced_by(self, delta: Duration) -> Self {
        match self {
            Clock::System => Clock::System,
            Clock::Fixed(t) => Clock::Fixed(t + delta),
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` pinned at [`fixed_now`].
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_does_not_move() {
        let clock = fixed_clock();
        assert_eq!(clock.now(), clock.now());
        assert!(clock.is_fixed());
    }

    #[test]
    fn advanced_fixed_clock_moves_forward() {
        let later = fixed_clock().advanced_by(Duration::minutes(11));
        assert_eq!(later.now(), fixed_now() + Duration::minutes(11));
    }

    #[test]
    fn system_clock_ignores_advance() {
        assert!(!Clock::system().advanced_by(Duration::hours(1)).is_fixed());
    }
}
