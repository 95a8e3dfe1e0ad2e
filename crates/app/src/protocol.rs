//! Line-delimited JSON front end for [`TestService`].
//!
//! Each input line is one request; each output line is one response carrying
//! an HTTP-style status. Malformed lines get a 400 and the stream continues.
//!
//! ```text
//! {"op":"start","body":{"questionBankId":1,"numberOfQuestions":5}}
//! {"op":"submit","body":{"testSessionId":"..","answers":[..]}}
//! {"op":"status","body":{"testSessionId":".."}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use exam_core::model::TestSessionId;
use services::{StartTestRequest, SubmitTestRequest, TestError, TestService};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub test_session_id: TestSessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", content = "body", rename_all = "camelCase")]
pub enum Request {
    Start(StartTestRequest),
    Submit(SubmitTestRequest),
    Status(StatusRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    fn ok(body: impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self {
                status: 200,
                body: Some(body),
                error: None,
            },
            Err(err) => Self::failure(500, "Internal", err.to_string()),
        }
    }

    fn failure(status: u16, kind: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: None,
            error: Some(ErrorBody {
                kind: kind.to_string(),
                message: message.into(),
            }),
        }
    }

    fn from_error(err: &TestError) -> Self {
        let status = err.status_code();
        // Internal detail stays in the log.
        let message = if status >= 500 {
            "internal error".to_string()
        } else {
            err.to_string()
        };
        Self::failure(status, err.kind(), message)
    }

    /// Serialized form written to the output stream.
    #[must_use]
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"status":500,"error":{"kind":"Internal","message":"internal error"}}"#.to_string()
        })
    }
}

fn respond<T: Serialize>(result: Result<T, TestError>) -> Response {
    match result {
        Ok(body) => Response::ok(body),
        Err(err) => {
            if err.status_code() >= 500 {
                tracing::error!(error = %err, kind = err.kind(), "request failed");
            } else {
                tracing::debug!(error = %err, kind = err.kind(), "request rejected");
            }
            Response::from_error(&err)
        }
    }
}

/// Dispatch one parsed request.
pub async fn handle(service: &TestService, request: Request) -> Response {
    match request {
        Request::Start(start) => respond(service.start_test(&start).await),
        Request::Submit(submit) => respond(service.submit_test(&submit)),
        Request::Status(status) => respond(service.session_status(&status.test_session_id)),
    }
}

/// Parse and dispatch one input line.
pub async fn handle_line(service: &TestService, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle(service, request).await,
        Err(err) => {
            tracing::debug!(error = %err, "malformed request line");
            Response::failure(400, "BadRequest", err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use exam_core::model::{OptionId, OptionView, QuestionBankId, QuestionId, QuestionType, QuestionWithOptions};
    use exam_core::time::fixed_clock;
    use services::{SessionStore, TestPolicy};
    use storage::repository::{InMemoryRepository, QuestionBankRepository};

    async fn service() -> TestService {
        let repo = InMemoryRepository::new();
        let bank = QuestionBankId::new(7);
        repo.upsert_bank(bank, "Capitals").await.unwrap();
        for id in 1..=3 {
            let question = QuestionWithOptions {
                question_id: QuestionId::new(id),
                content: format!("Capital #{id}?"),
                question_type: QuestionType::SingleChoice,
                options: vec![
                    OptionView {
                        option_id: OptionId::new(1),
                        content: "Paris".into(),
                        is_correct: true,
                    },
                    OptionView {
                        option_id: OptionId::new(2),
                        content: "Lyon".into(),
                        is_correct: false,
                    },
                ],
            };
            repo.upsert_question(bank, &question).await.unwrap();
        }
        TestService::new(
            fixed_clock(),
            TestPolicy::default(),
            Arc::new(repo),
            SessionStore::new(),
        )
    }

    fn session_id(response: &Response) -> String {
        response.body.as_ref().unwrap()["testSessionId"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn start_submit_round_over_lines() {
        let service = service().await;
        let started = handle_line(
            &service,
            r#"{"op":"start","body":{"questionBankId":7,"numberOfQuestions":3}}"#,
        )
        .await;
        assert_eq!(started.status, 200);
        let body = started.body.as_ref().unwrap();
        assert_eq!(body["questions"].as_array().unwrap().len(), 3);
        assert_eq!(body["durationMinutes"], 6);
        assert!(!started.to_line().contains("isCorrect"));

        let id = session_id(&started);
        let submit = format!(
            r#"{{"op":"submit","body":{{"testSessionId":"{id}","answers":[
                {{"questionId":1,"selectedOptionIds":[1]}},
                {{"questionId":2,"selectedOptionIds":[2]}}
            ]}}}}"#
        );
        let scored = handle_line(&service, &submit).await;
        assert_eq!(scored.status, 200);
        let body = scored.body.unwrap();
        assert_eq!(body["totalQuestions"], 3);
        assert_eq!(body["correctAnswers"], 1);
        assert_eq!(body["scorePercentage"], 33);

        let again = handle_line(&service, &submit).await;
        assert_eq!(again.status, 404);
        assert_eq!(again.error.unwrap().kind, "SessionNotFound");
    }

    #[tokio::test]
    async fn status_reports_remaining_time() {
        let service = service().await;
        let started = handle_line(
            &service,
            r#"{"op":"start","body":{"questionBankId":7,"numberOfQuestions":1}}"#,
        )
        .await;
        let id = session_id(&started);
        let status = handle_line(
            &service,
            &format!(r#"{{"op":"status","body":{{"testSessionId":"{id}"}}}}"#),
        )
        .await;
        assert_eq!(status.status, 200);
        let body = status.body.unwrap();
        assert_eq!(body["state"], "active");
        assert_eq!(body["remainingSeconds"], 120);
    }

    #[tokio::test]
    async fn semantic_errors_carry_their_status() {
        let service = service().await;
        let missing = handle_line(
            &service,
            r#"{"op":"start","body":{"questionBankId":99,"numberOfQuestions":1}}"#,
        )
        .await;
        assert_eq!(missing.status, 404);
        assert_eq!(missing.error.unwrap().kind, "BankNotFound");

        let too_many = handle_line(
            &service,
            r#"{"op":"start","body":{"questionBankId":7,"numberOfQuestions":20}}"#,
        )
        .await;
        assert_eq!(too_many.status, 400);
        let error = too_many.error.unwrap();
        assert_eq!(error.kind, "InsufficientQuestions");
        assert!(error.message.contains("only 3 questions"));
    }

    #[tokio::test]
    async fn malformed_lines_are_bad_requests() {
        let service = service().await;
        for line in ["not json", r#"{"op":"restart"}"#, r#"{"op":"start","body":{}}"#] {
            let response = handle_line(&service, line).await;
            assert_eq!(response.status, 400, "line: {line}");
            assert_eq!(response.error.unwrap().kind, "BadRequest");
        }
        assert!(service.sessions().is_empty());
    }

    #[test]
    fn error_lines_omit_body() {
        let line = Response::from_error(&TestError::SessionExpired).to_line();
        assert_eq!(
            line,
            r#"{"status":400,"error":{"kind":"SessionExpired","message":"test session has expired"}}"#
        );
    }
}
