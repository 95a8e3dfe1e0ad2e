mod common;

use std::sync::Arc;

use async_trait::async_trait;
use exam_core::model::{QuestionBankId, QuestionBankSummary, QuestionId, QuestionWithOptions};
use exam_core::time::fixed_clock;
use services::{SessionStore, TestError, TestPolicy, TestService};
use storage::repository::{InMemoryRepository, QuestionBankGateway, StorageError};

use common::{BANK, bank_with, start};

#[derive(Clone, Copy)]
enum Fault {
    DropLastQuestion,
    SwapQuestion,
    DuplicateSample,
    ShortSample,
    FetchFails,
}

/// Delegates to a real bank but breaks one part of the contract.
struct FaultyGateway {
    inner: InMemoryRepository,
    fault: Fault,
}

#[async_trait]
impl QuestionBankGateway for FaultyGateway {
    async fn bank_summary(
        &self,
        bank_id: QuestionBankId,
    ) -> Result<Option<QuestionBankSummary>, StorageError> {
        self.inner.bank_summary(bank_id).await
    }

    async fn sample_question_ids(
        &self,
        bank_id: QuestionBankId,
        n: usize,
    ) -> Result<Vec<QuestionId>, StorageError> {
        let mut ids = self.inner.sample_question_ids(bank_id, n).await?;
        match self.fault {
            Fault::DuplicateSample if ids.len() > 1 => ids[1] = ids[0],
            Fault::ShortSample => {
                ids.pop();
            }
            _ => {}
        }
        Ok(ids)
    }

    async fn questions_with_options(
        &self,
        ids: &[QuestionId],
    ) -> Result<Vec<QuestionWithOptions>, StorageError> {
        let mut questions = self.inner.questions_with_options(ids).await?;
        match self.fault {
            Fault::DropLastQuestion => {
                questions.pop();
            }
            Fault::SwapQuestion => {
                if let Some(last) = questions.last_mut() {
                    last.question_id = QuestionId::new(9_999);
                }
            }
            Fault::FetchFails => return Err(StorageError::Connection("bank offline".into())),
            _ => {}
        }
        Ok(questions)
    }
}

async fn faulty_service(fault: Fault) -> TestService {
    let gateway = FaultyGateway {
        inner: bank_with(10).await,
        fault,
    };
    TestService::new(
        fixed_clock(),
        TestPolicy::default(),
        Arc::new(gateway),
        SessionStore::new(),
    )
}

#[tokio::test]
async fn missing_questions_are_reported_not_ignored() {
    let service = faulty_service(Fault::DropLastQuestion).await;
    let err = service.start_test(&start(BANK, 3)).await.unwrap_err();
    assert!(matches!(
        err,
        TestError::InconsistentGatewayData {
            requested: 3,
            received: 2
        }
    ));
    assert_eq!(err.status_code(), 500);
    assert!(service.sessions().is_empty());
}

#[tokio::test]
async fn substituted_question_is_reported() {
    let service = faulty_service(Fault::SwapQuestion).await;
    let err = service.start_test(&start(BANK, 3)).await.unwrap_err();
    assert!(matches!(err, TestError::InconsistentGatewayData { .. }));
    assert!(service.sessions().is_empty());
}

#[tokio::test]
async fn duplicate_sample_is_reported() {
    let service = faulty_service(Fault::DuplicateSample).await;
    let err = service.start_test(&start(BANK, 4)).await.unwrap_err();
    assert!(matches!(err, TestError::InconsistentGatewayData { .. }));
    assert!(service.sessions().is_empty());
}

#[tokio::test]
async fn short_sample_is_reported() {
    let service = faulty_service(Fault::ShortSample).await;
    let err = service.start_test(&start(BANK, 4)).await.unwrap_err();
    assert!(matches!(
        err,
        TestError::InconsistentGatewayData {
            requested: 4,
            received: 3
        }
    ));
}

#[tokio::test]
async fn gateway_failure_creates_no_session() {
    let service = faulty_service(Fault::FetchFails).await;
    let err = service.start_test(&start(BANK, 2)).await.unwrap_err();
    assert!(matches!(err, TestError::Storage(StorageError::Connection(_))));
    assert!(service.sessions().is_empty());
}
