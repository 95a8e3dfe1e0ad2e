use chrono::{DateTime, Duration, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::answer_key::AnswerKey;
use crate::model::ids::{QuestionBankId, TestSessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session duration must be positive")]
    NonPositiveDuration,

    #[error("session answer key is empty")]
    EmptyAnswerKey,

    #[error("session expiry is out of range")]
    ExpiryOutOfRange,
}

/// Server-held record binding one started test to its answer key.
///
/// Immutable after creation; only its presence in the session store changes.
#[derive(Clone, PartialEq, Eq)]
pub struct TestSession {
    id: TestSessionId,
    question_bank_id: QuestionBankId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    answer_key: AnswerKey,
}

impl TestSession {
    /// Build a session that expires `duration` after `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NonPositiveDuration` for a zero or negative duration.
    /// Returns `SessionError::EmptyAnswerKey` if the key covers no questions.
    /// Returns `SessionError::ExpiryOutOfRange` if the expiry cannot be represented.
    pub fn new(
        id: TestSessionId,
        question_bank_id: QuestionBankId,
        created_at: DateTime<Utc>,
        duration: Duration,
        answer_key: AnswerKey,
    ) -> Result<Self, SessionError> {
        if duration <= Duration::zero() {
            return Err(SessionError::NonPositiveDuration);
        }
        if answer_key.is_empty() {
            return Err(SessionError::EmptyAnswerKey);
        }
        let expires_at = created_at
            .checked_add_signed(duration)
            .ok_or(SessionError::ExpiryOutOfRange)?;

        Ok(Self {
            id,
            question_bank_id,
            created_at,
            expires_at,
            answer_key,
        })
    }

    /// Same session under a different id; used when an id collides on insert.
    #[must_use]
    pub fn with_id(mut self, id: TestSessionId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> &TestSessionId {
        &self.id
    }

    #[must_use]
    pub fn question_bank_id(&self) -> QuestionBankId {
        self.question_bank_id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn answer_key(&self) -> &AnswerKey {
        &self.answer_key
    }

    /// A session is expired once `now` reaches `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before expiry, clamped at zero.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("id", &self.id)
            .field("question_bank_id", &self.question_bank_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("questions", &self.answer_key.len())
            .finish_non_exhaustive()
    }
}
