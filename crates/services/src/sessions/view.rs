use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exam_core::model::{QuestionBankId, QuestionView, SubmittedAnswer, TestSessionId};

/// Request to start a test drawn from one bank.
///
/// `number_of_questions` stays signed so non-positive input from the wire
/// reaches the service and is rejected there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTestRequest {
    pub question_bank_id: QuestionBankId,
    pub number_of_questions: i64,
}

/// Client-facing payload of a started test. Carries no correctness data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedTest {
    pub test_session_id: TestSessionId,
    pub question_bank_id: QuestionBankId,
    pub expires_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestRequest {
    pub test_session_id: TestSessionId,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

/// Non-consuming view of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionStatus {
    #[serde(rename_all = "camelCase")]
    Active {
        expires_at: DateTime<Utc>,
        remaining_seconds: i64,
    },
    #[serde(rename_all = "camelCase")]
    Expired { expired_at: DateTime<Utc> },
}
