use std::sync::Arc;

use storage::repository::Storage;
use tokio::task::JoinHandle;

use crate::Clock;
use crate::config::TestPolicy;
use crate::error::AppServicesError;
use crate::sessions::{SessionStore, TestService, spawn_session_sweeper};

/// Assembles the process-wide session store and the services built on it.
///
/// Build once at startup and clone freely; every clone shares one store.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    policy: TestPolicy,
    sessions: SessionStore,
    tests: Arc<TestService>,
}

impl AppServices {
    /// Build services over an already opened storage backend.
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, policy: TestPolicy) -> Self {
        let sessions = SessionStore::new();
        let tests = Arc::new(TestService::new(
            clock,
            policy,
            Arc::clone(&storage.gateway),
            sessions.clone(),
        ));
        Self {
            clock,
            policy,
            sessions,
            tests,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        policy: TestPolicy,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, policy))
    }

    #[must_use]
    pub fn tests(&self) -> Arc<TestService> {
        Arc::clone(&self.tests)
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn policy(&self) -> TestPolicy {
        self.policy
    }

    /// Start the background sweeper for this instance's store.
    #[must_use]
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        spawn_session_sweeper(self.sessions.clone(), self.clock, self.policy)
    }
}
