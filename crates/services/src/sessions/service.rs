use std::collections::HashSet;
use std::sync::Arc;

use exam_core::model::{AnswerKey, QuestionId, TestResult, TestSession, TestSessionId};
use exam_core::calculate_score;
use storage::repository::QuestionBankGateway;

use super::store::SessionStore;
use super::view::{SessionStatus, StartTestRequest, StartedTest, SubmitTestRequest};
use crate::Clock;
use crate::config::TestPolicy;
use crate::error::TestError;

/// Starts timed tests and scores their submissions.
///
/// Stateless apart from the shared [`SessionStore`]; cheap to clone and safe to
/// call from many tasks at once.
#[derive(Clone)]
pub struct TestService {
    clock: Clock,
    policy: TestPolicy,
    gateway: Arc<dyn QuestionBankGateway>,
    sessions: SessionStore,
}

impl TestService {
    #[must_use]
    pub fn new(
        clock: Clock,
        policy: TestPolicy,
        gateway: Arc<dyn QuestionBankGateway>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            clock,
            policy,
            gateway,
            sessions,
        }
    }

    /// Same service reading time from `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn policy(&self) -> &TestPolicy {
        &self.policy
    }

    /// Sample questions, stash their answer key in a new session and return
    /// the answer-free question list.
    ///
    /// Nothing is stored unless every step succeeds.
    ///
    /// # Errors
    ///
    /// Returns `TestError::InvalidQuestionCount` for a non-positive count,
    /// `TestError::BankNotFound`, `TestError::InsufficientQuestions` when the
    /// bank is too small, `TestError::InconsistentGatewayData` when the bank
    /// hands back fewer or different questions than sampled, and
    /// `TestError::Storage` for gateway failures.
    pub async fn start_test(&self, request: &StartTestRequest) -> Result<StartedTest, TestError> {
        let bank_id = request.question_bank_id;
        let requested = u64::try_from(request.number_of_questions)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(TestError::InvalidQuestionCount {
                requested: request.number_of_questions,
            })?;

        let summary = self
            .gateway
            .bank_summary(bank_id)
            .await?
            .ok_or(TestError::BankNotFound { bank_id })?;
        if summary.total_question_count < requested {
            return Err(TestError::InsufficientQuestions {
                available: summary.total_question_count,
                requested,
            });
        }
        // Bounded by the bank size checked above.
        let wanted = usize::try_from(requested).map_err(|_| TestError::InsufficientQuestions {
            available: summary.total_question_count,
            requested,
        })?;

        let ids = self.gateway.sample_question_ids(bank_id, wanted).await?;
        let distinct: HashSet<QuestionId> = ids.iter().copied().collect();
        if ids.len() != wanted || distinct.len() != wanted {
            tracing::error!(bank = %bank_id, wanted, sampled = ids.len(), "bank returned a bad sample");
            return Err(TestError::InconsistentGatewayData {
                requested: wanted,
                received: distinct.len(),
            });
        }

        let questions = self.gateway.questions_with_options(&ids).await?;
        let fetched: HashSet<QuestionId> = questions.iter().map(|q| q.question_id).collect();
        if questions.len() != ids.len() || fetched != distinct {
            tracing::error!(
                bank = %bank_id,
                requested = ids.len(),
                received = questions.len(),
                "bank returned questions that do not match the sample"
            );
            return Err(TestError::InconsistentGatewayData {
                requested: ids.len(),
                received: fetched.intersection(&distinct).count(),
            });
        }

        let answer_key = AnswerKey::from_questions(&questions);
        let duration = self.policy.session_duration(requested);
        let session = TestSession::new(
            self.sessions.next_id(),
            bank_id,
            self.clock.now(),
            duration,
            answer_key,
        )?;
        let session = self.sessions.create(session)?;

        tracing::info!(
            session = %session.id(),
            bank = %bank_id,
            questions = wanted,
            expires_at = %session.expires_at(),
            "test started"
        );

        Ok(StartedTest {
            test_session_id: session.id().clone(),
            question_bank_id: bank_id,
            expires_at: session.expires_at(),
            duration_minutes: duration.num_minutes(),
            questions: questions.iter().map(|q| q.to_view()).collect(),
        })
    }

    /// Score a submission and retire its session.
    ///
    /// The session is removed before scoring, so a session is scored at most
    /// once even when submissions race; an expired session is removed too.
    ///
    /// # Errors
    ///
    /// Returns `TestError::SessionNotFound` for unknown or already submitted
    /// sessions and `TestError::SessionExpired` once the time limit has passed.
    pub fn submit_test(&self, request: &SubmitTestRequest) -> Result<TestResult, TestError> {
        let session = self
            .sessions
            .take(&request.test_session_id)
            .ok_or(TestError::SessionNotFound)?;

        let now = self.clock.now();
        if session.is_expired_at(now) {
            tracing::warn!(
                session = %session.id(),
                expired_at = %session.expires_at(),
                "submission after expiry"
            );
            return Err(TestError::SessionExpired);
        }

        let result = calculate_score(session.answer_key(), &request.answers);
        tracing::info!(
            session = %session.id(),
            total = result.total_questions,
            correct = result.correct_answers,
            score = result.score_percentage,
            "test scored"
        );
        Ok(result)
    }

    /// Report whether a session is still open without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `TestError::SessionNotFound` if the session is absent.
    pub fn session_status(&self, id: &TestSessionId) -> Result<SessionStatus, TestError> {
        let session = self.sessions.get(id).ok_or(TestError::SessionNotFound)?;
        let now = self.clock.now();
        if session.is_expired_at(now) {
            return Ok(SessionStatus::Expired {
                expired_at: session.expires_at(),
            });
        }
        Ok(SessionStatus::Active {
            expires_at: session.expires_at(),
            remaining_seconds: session.remaining_at(now).num_seconds(),
        })
    }
}

impl std::fmt::Debug for TestService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestService")
            .field("clock", &self.clock)
            .field("policy", &self.policy)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}
