use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionBankId, QuestionId};

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// Read-only snapshot of a bank's size, as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionBankSummary {
    pub bank_id: QuestionBankId,
    pub total_question_count: u64,
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
}

impl QuestionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
        }
    }
}

/// One answer option, including whether it is correct.
///
/// Only lives on the server side; clients receive [`OptionPublicView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub option_id: OptionId,
    pub content: String,
    pub is_correct: bool,
}

/// A question with its ordered options as fetched from the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionWithOptions {
    pub question_id: QuestionId,
    pub content: String,
    pub question_type: QuestionType,
    pub options: Vec<OptionView>,
}

impl QuestionWithOptions {
    /// Check the structural rules a bank question must satisfy.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for empty content, no options, blank option text,
    /// or a repeated option id.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.content.trim().is_empty() {
            return Err(QuestionError::EmptyContent {
                question_id: self.question_id,
            });
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions {
                question_id: self.question_id,
            });
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if option.content.trim().is_empty() {
                return Err(QuestionError::EmptyOption {
                    question_id: self.question_id,
                    option_id: option.option_id,
                });
            }
            if !seen.insert(option.option_id) {
                return Err(QuestionError::DuplicateOption {
                    question_id: self.question_id,
                    option_id: option.option_id,
                });
            }
        }
        Ok(())
    }

    /// Ids of the options flagged as correct, in option order.
    pub fn correct_option_ids(&self) -> impl Iterator<Item = OptionId> + '_ {
        self.options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.option_id)
    }

    /// Client-facing projection with correctness flags stripped.
    #[must_use]
    pub fn to_view(&self) -> QuestionView {
        QuestionView {
            question_id: self.question_id,
            content: self.content.clone(),
            question_type: self.question_type,
            options: self
                .options
                .iter()
                .map(|o| OptionPublicView {
                    option_id: o.option_id,
                    content: o.content.clone(),
                })
                .collect(),
        }
    }
}

//
// ─── CLIENT PROJECTIONS ────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionPublicView {
    pub option_id: OptionId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub content: String,
    pub question_type: QuestionType,
    pub options: Vec<OptionPublicView>,
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {question_id} has empty content")]
    EmptyContent { question_id: QuestionId },

    #[error("question {question_id} has no options")]
    NoOptions { question_id: QuestionId },

    #[error("option {option_id} of question {question_id} has empty content")]
    EmptyOption {
        question_id: QuestionId,
        option_id: OptionId,
    },

    #[error("option {option_id} appears twice in question {question_id}")]
    DuplicateOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
