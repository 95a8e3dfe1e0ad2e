use exam_core::model::{OptionId, OptionView, QuestionBankId, QuestionId, QuestionType};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn bank_id_to_i64(id: QuestionBankId) -> Result<i64, StorageError> {
    u64_to_i64("bank_id", id.value())
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    u64_to_i64("question_id", id.value())
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn parse_question_type(s: &str) -> Result<QuestionType, StorageError> {
    match s {
        "single_choice" => Ok(QuestionType::SingleChoice),
        "multiple_choice" => Ok(QuestionType::MultipleChoice),
        "true_false" => Ok(QuestionType::TrueFalse),
        _ => Err(StorageError::Serialization(format!(
            "invalid question_type: {s}"
        ))),
    }
}

/// Columns: `id, content, question_type`. Options are attached separately.
pub(crate) fn map_question_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(QuestionId, String, QuestionType), StorageError> {
    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let content: String = row.try_get("content").map_err(ser)?;
    let question_type = parse_question_type(&row.try_get::<String, _>("question_type").map_err(ser)?)?;
    Ok((id, content, question_type))
}

/// Columns: `question_id, id, content, is_correct`.
pub(crate) fn map_option_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(QuestionId, OptionView), StorageError> {
    let question_id = question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?;
    let option_id = OptionId::new(i64_to_u64(
        "option_id",
        row.try_get::<i64, _>("id").map_err(ser)?,
    )?);
    let content: String = row.try_get("content").map_err(ser)?;
    let is_correct: bool = row.try_get("is_correct").map_err(ser)?;
    Ok((
        question_id,
        OptionView {
            option_id,
            content,
            is_correct,
        },
    ))
}

/// `?1, ?2, ...` placeholders starting at `first`.
pub(crate) fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_round_trips_through_text() {
        for ty in [
            QuestionType::SingleChoice,
            QuestionType::MultipleChoice,
            QuestionType::TrueFalse,
        ] {
            assert_eq!(parse_question_type(ty.as_str()).unwrap(), ty);
        }
        assert!(parse_question_type("essay").is_err());
    }

    #[test]
    fn placeholders_are_numbered() {
        assert_eq!(placeholders(2, 3), "?2, ?3, ?4");
        assert_eq!(placeholders(1, 0), "");
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(question_id_from_i64(-1).is_err());
    }
}
