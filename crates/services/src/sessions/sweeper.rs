//! Background reclamation of abandoned sessions.
//!
//! Memory hygiene only: submissions check expiry themselves, so a session the
//! sweeper has not reached yet is still rejected once expired.

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::store::SessionStore;
use crate::Clock;
use crate::config::TestPolicy;

/// Remove sessions that expired more than `policy.sweep_grace()` before `now`.
///
/// Returns how many sessions were removed.
pub fn sweep_expired_sessions(store: &SessionStore, now: DateTime<Utc>, policy: &TestPolicy) -> usize {
    let Some(cutoff) = now.checked_sub_signed(policy.sweep_grace()) else {
        return 0;
    };
    let purged = store.purge_expired_before(cutoff);
    if purged > 0 {
        tracing::info!(purged, live = store.len(), "swept abandoned test sessions");
    }
    purged
}

/// Run [`sweep_expired_sessions`] every `policy.sweep_interval()` on the
/// current tokio runtime until the returned handle is aborted.
#[must_use]
pub fn spawn_session_sweeper(store: SessionStore, clock: Clock, policy: TestPolicy) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(policy.sweep_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_expired_sessions(&store, clock.now(), &policy);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::{
        AnswerKey, OptionId, QuestionBankId, QuestionId, TestSession, TestSessionId,
    };
    use exam_core::time::{fixed_clock, fixed_now};
    use std::collections::BTreeSet;

    fn insert(store: &SessionStore, id: &str, minutes: i64) {
        let key: AnswerKey = [(QuestionId::new(1), BTreeSet::from([OptionId::new(2)]))]
            .into_iter()
            .collect();
        let session = TestSession::new(
            TestSessionId::new(id),
            QuestionBankId::new(1),
            fixed_now(),
            Duration::minutes(minutes),
            key,
        )
        .unwrap();
        store.create(session).unwrap();
    }

    #[test]
    fn grace_period_keeps_recently_expired_sessions() {
        let store = SessionStore::new();
        insert(&store, "recent", 2);
        let policy = TestPolicy::default().with_sweep_grace(Duration::minutes(10));

        let swept = sweep_expired_sessions(&store, fixed_now() + Duration::minutes(5), &policy);
        assert_eq!(swept, 0);
        assert_eq!(store.len(), 1);

        let swept = sweep_expired_sessions(&store, fixed_now() + Duration::minutes(12), &policy);
        assert_eq!(swept, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn active_sessions_survive_a_sweep() {
        let store = SessionStore::new();
        insert(&store, "active", 60);
        insert(&store, "stale", 1);
        let policy = TestPolicy::default().with_sweep_grace(Duration::zero());

        let swept = sweep_expired_sessions(&store, fixed_now() + Duration::minutes(30), &policy);
        assert_eq!(swept, 1);
        assert!(store.get(&TestSessionId::new("active")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_sweeper_reclaims_abandoned_sessions() {
        let store = SessionStore::new();
        insert(&store, "abandoned", 2);
        let policy = TestPolicy::default()
            .with_sweep_interval(std::time::Duration::from_secs(1))
            .with_sweep_grace(Duration::minutes(1));
        let clock = fixed_clock().advanced_by(Duration::hours(1));

        let handle = spawn_session_sweeper(store.clone(), clock, policy);
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        handle.abort();

        assert!(store.is_empty());
    }
}
