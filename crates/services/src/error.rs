//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{QuestionBankId, SessionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the session store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    #[error("could not allocate a unique session id after {attempts} attempts")]
    IdCollision { attempts: usize },
}

/// Errors emitted by `TestService`.
///
/// The first five variants are semantic outcomes the outer API maps straight
/// to a response; the rest are internal faults.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TestError {
    #[error("number of questions must be positive, got {requested}")]
    InvalidQuestionCount { requested: i64 },
    #[error("question bank {bank_id} not found")]
    BankNotFound { bank_id: QuestionBankId },
    #[error("question bank has only {available} questions, {requested} requested")]
    InsufficientQuestions { available: u64, requested: u64 },
    #[error("test session not found")]
    SessionNotFound,
    #[error("test session has expired")]
    SessionExpired,
    #[error("question bank returned {received} questions for {requested} requested ids")]
    InconsistentGatewayData { requested: usize, received: usize },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TestError {
    /// HTTP status the outer API layer answers with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            TestError::InvalidQuestionCount { .. }
            | TestError::InsufficientQuestions { .. }
            | TestError::SessionExpired => 400,
            TestError::BankNotFound { .. } | TestError::SessionNotFound => 404,
            TestError::InconsistentGatewayData { .. }
            | TestError::Session(_)
            | TestError::Store(_)
            | TestError::Storage(_) => 500,
        }
    }

    /// Stable tag for clients; internal faults share one tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            TestError::InvalidQuestionCount { .. } => "InvalidQuestionCount",
            TestError::BankNotFound { .. } => "BankNotFound",
            TestError::InsufficientQuestions { .. } => "InsufficientQuestions",
            TestError::SessionNotFound => "SessionNotFound",
            TestError::SessionExpired => "SessionExpired",
            TestError::InconsistentGatewayData { .. } => "InconsistentGatewayData",
            TestError::Session(_) | TestError::Store(_) | TestError::Storage(_) => "Internal",
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
