#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use exam_core::model::{
    OptionId, OptionView, QuestionBankId, QuestionId, QuestionType, QuestionWithOptions,
    SubmittedAnswer,
};
use exam_core::time::fixed_clock;
use services::{SessionStore, StartTestRequest, TestPolicy, TestService};
use storage::repository::{InMemoryRepository, QuestionBankRepository};

pub const BANK: u64 = 1;

/// Question `id` has four options; option `id % 4 + 1` is the only correct one,
/// except every third question which also accepts option 1.
pub fn correct_options(id: u64) -> Vec<u64> {
    let single = id % 4 + 1;
    if id % 3 == 0 && single != 1 {
        vec![1, single]
    } else {
        vec![single]
    }
}

pub fn question(id: u64) -> QuestionWithOptions {
    let correct = correct_options(id);
    QuestionWithOptions {
        question_id: QuestionId::new(id),
        content: format!("Question {id}"),
        question_type: if correct.len() > 1 {
            QuestionType::MultipleChoice
        } else {
            QuestionType::SingleChoice
        },
        options: (1..=4)
            .map(|o| OptionView {
                option_id: OptionId::new(o),
                content: format!("Option {o}"),
                is_correct: correct.contains(&o),
            })
            .collect(),
    }
}

pub async fn bank_with(count: u64) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.upsert_bank(QuestionBankId::new(BANK), "Bank")
        .await
        .unwrap();
    for id in 1..=count {
        repo.upsert_question(QuestionBankId::new(BANK), &question(id))
            .await
            .unwrap();
    }
    repo
}

pub fn service(repo: InMemoryRepository) -> TestService {
    TestService::new(
        fixed_clock(),
        TestPolicy::default(),
        Arc::new(repo),
        SessionStore::new(),
    )
}

pub fn start(bank: u64, n: i64) -> StartTestRequest {
    StartTestRequest {
        question_bank_id: QuestionBankId::new(bank),
        number_of_questions: n,
    }
}

/// The fully correct answer for every given question.
pub fn perfect_answers(ids: &[QuestionId]) -> Vec<SubmittedAnswer> {
    ids.iter()
        .map(|id| {
            SubmittedAnswer::new(
                *id,
                correct_options(id.value()).into_iter().map(OptionId::new),
            )
        })
        .collect()
}

pub fn correct_lookup(ids: &[QuestionId]) -> HashMap<QuestionId, Vec<u64>> {
    ids.iter()
        .map(|id| (*id, correct_options(id.value())))
        .collect()
}
