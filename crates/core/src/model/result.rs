use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::ids::{OptionId, QuestionId};

/// One answer sent back by the client. Duplicate option ids collapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    #[serde(default)]
    pub selected_option_ids: BTreeSet<OptionId>,
}

impl SubmittedAnswer {
    #[must_use]
    pub fn new(question_id: QuestionId, selected: impl IntoIterator<Item = OptionId>) -> Self {
        Self {
            question_id,
            selected_option_ids: selected.into_iter().collect(),
        }
    }
}

/// Aggregate outcome of scoring one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub score_percentage: u32,
}
