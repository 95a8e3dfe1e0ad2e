//! Process-wide store of live test sessions.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use exam_core::model::{TestSession, TestSessionId};

use crate::error::StoreError;

/// Attempts at drawing a fresh id before `create` gives up.
const MAX_ID_ATTEMPTS: usize = 8;

type IdSource = Arc<dyn Fn() -> TestSessionId + Send + Sync>;

/// Thread-safe keyed store of [`TestSession`]s.
///
/// One instance is shared by every request (clones share the same map).
/// Each operation takes the lock for a single map access and never across an
/// await point. Expiry is not enforced here: `get` and `take` return expired
/// sessions so the caller can tell "expired" from "absent".
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<TestSessionId, Arc<TestSession>>>>,
    id_source: IdSource,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_id_source(TestSessionId::generate)
    }

    /// Store drawing ids from `source` instead of the CSPRNG.
    #[must_use]
    pub fn with_id_source(source: impl Fn() -> TestSessionId + Send + Sync + 'static) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            id_source: Arc::new(source),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TestSessionId, Arc<TestSession>>> {
        // The map holds no cross-entry invariant, so a poisoned lock is still usable.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draw an id for a session about to be created.
    #[must_use]
    pub fn next_id(&self) -> TestSessionId {
        (self.id_source)()
    }

    /// Insert `session`, re-keying it with a fresh id while its id is taken.
    ///
    /// Returns the stored session, whose id may differ from the one passed in.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IdCollision` if no free id was found.
    pub fn create(&self, mut session: TestSession) -> Result<Arc<TestSession>, StoreError> {
        let mut guard = self.lock();
        for _ in 0..MAX_ID_ATTEMPTS {
            match guard.entry(session.id().clone()) {
                Entry::Occupied(_) => {
                    tracing::warn!("session id collision, drawing a new id");
                    session = session.with_id(self.next_id());
                }
                Entry::Vacant(slot) => {
                    let stored = Arc::new(session);
                    slot.insert(Arc::clone(&stored));
                    tracing::debug!(session = %stored.id(), live = guard.len(), "session created");
                    return Ok(stored);
                }
            }
        }
        Err(StoreError::IdCollision {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    /// Look up a session, expired or not.
    #[must_use]
    pub fn get(&self, id: &TestSessionId) -> Option<Arc<TestSession>> {
        self.lock().get(id).cloned()
    }

    /// Delete a session. Removing an absent id is a no-op; returns whether
    /// anything was removed.
    pub fn remove(&self, id: &TestSessionId) -> bool {
        self.take(id).is_some()
    }

    /// Atomically remove a session and hand it back.
    ///
    /// Of several concurrent callers for the same id, exactly one gets `Some`.
    pub fn take(&self, id: &TestSessionId) -> Option<Arc<TestSession>> {
        let removed = self.lock().remove(id);
        if removed.is_some() {
            tracing::debug!(session = %id, "session removed");
        }
        removed
    }

    /// Number of sessions currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every session whose `expires_at` is at or before `cutoff`.
    pub(crate) fn purge_expired_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut guard = self.lock();
        let before = guard.len();
        guard.retain(|_, session| session.expires_at() > cutoff);
        before - guard.len()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("live", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::{AnswerKey, OptionId, QuestionBankId, QuestionId};
    use exam_core::time::fixed_now;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session(id: &str, minutes: i64) -> TestSession {
        let key: AnswerKey = [(QuestionId::new(1), BTreeSet::from([OptionId::new(1)]))]
            .into_iter()
            .collect();
        TestSession::new(
            TestSessionId::new(id),
            QuestionBankId::new(1),
            fixed_now(),
            Duration::minutes(minutes),
            key,
        )
        .unwrap()
    }

    #[test]
    fn create_then_get_returns_the_session() {
        let store = SessionStore::new();
        let stored = store.create(session("a", 2)).unwrap();
        assert_eq!(stored.id().as_str(), "a");
        assert_eq!(store.get(&TestSessionId::new("a")).unwrap(), stored);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_returns_expired_sessions() {
        let store = SessionStore::new();
        store.create(session("a", 1)).unwrap();
        let found = store.get(&TestSessionId::new("a")).unwrap();
        assert!(found.is_expired_at(fixed_now() + Duration::hours(1)));
    }

    #[test]
    fn remove_is_idempotent() {
        let store = SessionStore::new();
        store.create(session("a", 2)).unwrap();
        assert!(store.remove(&TestSessionId::new("a")));
        assert!(!store.remove(&TestSessionId::new("a")));
        assert!(!store.remove(&TestSessionId::new("never-existed")));
        assert!(store.is_empty());
    }

    #[test]
    fn take_hands_out_a_session_once() {
        let store = SessionStore::new();
        store.create(session("a", 2)).unwrap();
        assert!(store.take(&TestSessionId::new("a")).is_some());
        assert!(store.take(&TestSessionId::new("a")).is_none());
    }

    #[test]
    fn collision_draws_a_new_id_instead_of_overwriting() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let store = SessionStore::with_id_source(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            TestSessionId::new(format!("fresh-{n}"))
        });

        let first = store.create(session("dup", 2)).unwrap();
        let second = store.create(session("dup", 5)).unwrap();

        assert_eq!(first.id().as_str(), "dup");
        assert_eq!(second.id().as_str(), "fresh-0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.get(&TestSessionId::new("dup")).unwrap().expires_at(),
            fixed_now() + Duration::minutes(2)
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn exhausted_id_source_fails_without_overwriting() {
        let store = SessionStore::with_id_source(|| TestSessionId::new("stuck"));
        store.create(session("stuck", 2)).unwrap();
        let err = store.create(session("stuck", 9)).unwrap_err();
        assert_eq!(
            err,
            StoreError::IdCollision {
                attempts: MAX_ID_ATTEMPTS
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn purge_drops_only_sessions_past_cutoff() {
        let store = SessionStore::new();
        store.create(session("short", 2)).unwrap();
        store.create(session("long", 30)).unwrap();

        let purged = store.purge_expired_before(fixed_now() + Duration::minutes(10));
        assert_eq!(purged, 1);
        assert!(store.get(&TestSessionId::new("short")).is_none());
        assert!(store.get(&TestSessionId::new("long")).is_some());
    }

    #[test]
    fn concurrent_takes_yield_exactly_one_winner() {
        let store = SessionStore::new();
        store.create(session("race", 2)).unwrap();

        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let store = store.clone();
                    scope.spawn(move || store.take(&TestSessionId::new("race")).is_some())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });
        assert_eq!(winners, 1);
    }

    #[test]
    fn clones_share_the_same_sessions() {
        let store = SessionStore::new();
        let other = store.clone();
        store.create(session("shared", 2)).unwrap();
        assert!(other.get(&TestSessionId::new("shared")).is_some());
    }
}
