//! Set-based scoring of a submission against a session's answer key.

use std::collections::{BTreeSet, HashMap};

use crate::model::{AnswerKey, OptionId, QuestionId, SubmittedAnswer, TestResult};

/// Score `answers` against `key`.
///
/// A question counts as correct only when the submitted option set equals the
/// key's set exactly. Questions without a submitted answer are scored against
/// the empty set; answers for questions outside the key are ignored. When one
/// question is answered more than once, the last answer wins.
///
/// `score_percentage` is `correct * 100 / total` rounded half-up to the nearest
/// integer, and `0` for an empty key.
#[must_use]
pub fn calculate_score(key: &AnswerKey, answers: &[SubmittedAnswer]) -> TestResult {
    let submitted: HashMap<QuestionId, &BTreeSet<OptionId>> = answers
        .iter()
        .map(|a| (a.question_id, &a.selected_option_ids))
        .collect();
    let empty = BTreeSet::new();

    let correct = key
        .iter()
        .filter(|(question_id, expected)| {
            let selected = submitted.get(question_id).copied().unwrap_or(&empty);
            selected == *expected
        })
        .count();

    let total = u32::try_from(key.len()).unwrap_or(u32::MAX);
    let correct = u32::try_from(correct).unwrap_or(u32::MAX);

    TestResult {
        total_questions: total,
        correct_answers: correct,
        score_percentage: percentage(correct, total),
    }
}

fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (correct, total) = (u64::from(correct), u64::from(total));
    let rounded = (correct * 100 + total / 2) / total;
    u32::try_from(rounded).unwrap_or(100)
}
