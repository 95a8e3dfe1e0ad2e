use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::{OptionId, QuestionId};
use crate::model::question::QuestionWithOptions;

/// Private mapping from each sampled question to its set of correct options.
///
/// Deliberately not `Serialize`: the key never leaves the server.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct AnswerKey {
    correct: BTreeMap<QuestionId, BTreeSet<OptionId>>,
}

impl AnswerKey {
    /// Build the key from fetched questions. A question without any correct
    /// option maps to the empty set.
    #[must_use]
    pub fn from_questions(questions: &[QuestionWithOptions]) -> Self {
        let correct = questions
            .iter()
            .map(|q| (q.question_id, q.correct_option_ids().collect()))
            .collect();
        Self { correct }
    }

    /// Number of questions covered by the key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.correct.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.correct.is_empty()
    }

    #[must_use]
    pub fn contains(&self, question_id: QuestionId) -> bool {
        self.correct.contains_key(&question_id)
    }

    #[must_use]
    pub fn correct_options(&self, question_id: QuestionId) -> Option<&BTreeSet<OptionId>> {
        self.correct.get(&question_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &BTreeSet<OptionId>)> {
        self.correct.iter().map(|(id, set)| (*id, set))
    }
}

impl FromIterator<(QuestionId, BTreeSet<OptionId>)> for AnswerKey {
    fn from_iter<T: IntoIterator<Item = (QuestionId, BTreeSet<OptionId>)>>(iter: T) -> Self {
        Self {
            correct: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for AnswerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerKey")
            .field("questions", &self.correct.len())
            .finish_non_exhaustive()
    }
}
