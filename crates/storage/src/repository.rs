use async_trait::async_trait;
use exam_core::model::{
    QuestionBankId, QuestionBankSummary, QuestionError, QuestionId, QuestionWithOptions,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::sampling::sample_distinct;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Validation(#[from] QuestionError),
}

/// Read-side contract the test engine needs from the question bank.
#[async_trait]
pub trait QuestionBankGateway: Send + Sync {
    /// Size snapshot of a bank, or `None` if the bank does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn bank_summary(
        &self,
        bank_id: QuestionBankId,
    ) -> Result<Option<QuestionBankSummary>, StorageError>;

    /// Up to `n` distinct question ids drawn uniformly from the bank.
    ///
    /// Callers are expected to check `n` against the bank summary first; a
    /// bank with fewer than `n` questions yields all of them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn sample_question_ids(
        &self,
        bank_id: QuestionBankId,
        n: usize,
    ) -> Result<Vec<QuestionId>, StorageError>;

    /// Full question data, in the order of `ids`. Unknown ids are omitted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried or rows are malformed.
    async fn questions_with_options(
        &self,
        ids: &[QuestionId],
    ) -> Result<Vec<QuestionWithOptions>, StorageError>;
}

/// Write-side contract used to populate banks.
#[async_trait]
pub trait QuestionBankRepository: Send + Sync {
    /// Create or rename a bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be stored.
    async fn upsert_bank(&self, bank_id: QuestionBankId, name: &str) -> Result<(), StorageError>;

    /// Create or replace a question (and all its options) inside a bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` for malformed questions and
    /// `StorageError::NotFound` if the bank does not exist.
    async fn upsert_question(
        &self,
        bank_id: QuestionBankId,
        question: &QuestionWithOptions,
    ) -> Result<(), StorageError>;
}

#[derive(Default)]
struct BankState {
    banks: BTreeMap<QuestionBankId, String>,
    questions: BTreeMap<QuestionId, (QuestionBankId, QuestionWithOptions)>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<BankState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BankState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl QuestionBankGateway for InMemoryRepository {
    async fn bank_summary(
        &self,
        bank_id: QuestionBankId,
    ) -> Result<Option<QuestionBankSummary>, StorageError> {
        let guard = self.lock()?;
        if !guard.banks.contains_key(&bank_id) {
            return Ok(None);
        }
        let total = guard
            .questions
            .values()
            .filter(|(bank, _)| *bank == bank_id)
            .count();
        Ok(Some(QuestionBankSummary {
            bank_id,
            total_question_count: u64::try_from(total).unwrap_or(u64::MAX),
        }))
    }

    async fn sample_question_ids(
        &self,
        bank_id: QuestionBankId,
        n: usize,
    ) -> Result<Vec<QuestionId>, StorageError> {
        let pool: Vec<QuestionId> = {
            let guard = self.lock()?;
            guard
                .questions
                .iter()
                .filter(|(_, (bank, _))| *bank == bank_id)
                .map(|(id, _)| *id)
                .collect()
        };
        Ok(sample_distinct(pool, n, &mut rand::rng()))
    }

    async fn questions_with_options(
        &self,
        ids: &[QuestionId],
    ) -> Result<Vec<QuestionWithOptions>, StorageError> {
        let guard = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| guard.questions.get(id).map(|(_, q)| q.clone()))
            .collect())
    }
}

#[async_trait]
impl QuestionBankRepository for InMemoryRepository {
    async fn upsert_bank(&self, bank_id: QuestionBankId, name: &str) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.banks.insert(bank_id, name.to_owned());
        Ok(())
    }

    async fn upsert_question(
        &self,
        bank_id: QuestionBankId,
        question: &QuestionWithOptions,
    ) -> Result<(), StorageError> {
        question.validate()?;
        let mut guard = self.lock()?;
        if !guard.banks.contains_key(&bank_id) {
            return Err(StorageError::NotFound);
        }
        guard
            .questions
            .insert(question.question_id, (bank_id, question.clone()));
        Ok(())
    }
}

/// Aggregates the gateway and bank repository behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub gateway: Arc<dyn QuestionBankGateway>,
    pub banks: Arc<dyn QuestionBankRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let gateway: Arc<dyn QuestionBankGateway> = Arc::new(repo.clone());
        let banks: Arc<dyn QuestionBankRepository> = Arc::new(repo);
        Self { gateway, banks }
    }
}

/// Index questions by id; helper shared by backends that fetch unordered rows.
pub(crate) fn order_by_request(
    ids: &[QuestionId],
    fetched: Vec<QuestionWithOptions>,
) -> Vec<QuestionWithOptions> {
    let mut by_id: HashMap<QuestionId, QuestionWithOptions> =
        fetched.into_iter().map(|q| (q.question_id, q)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
