use std::collections::HashMap;

use exam_core::model::{
    OptionView, QuestionBankId, QuestionBankSummary, QuestionId, QuestionWithOptions,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    bank_id_to_i64, map_option_row, map_question_row, placeholders, question_id_from_i64,
    question_id_to_i64, u64_to_i64,
};
use crate::repository::{
    QuestionBankGateway, QuestionBankRepository, StorageError, order_by_request,
};
use crate::sampling::sample_distinct;

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl QuestionBankGateway for SqliteRepository {
    async fn bank_summary(
        &self,
        bank_id: QuestionBankId,
    ) -> Result<Option<QuestionBankSummary>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                (SELECT COUNT(*) FROM questions q WHERE q.bank_id = b.id) AS total
            FROM question_banks b
            WHERE b.id = ?1
            ",
        )
        .bind(bank_id_to_i64(bank_id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let total: i64 = row
            .try_get("total")
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(QuestionBankSummary {
            bank_id,
            total_question_count: u64::try_from(total).unwrap_or(0),
        }))
    }

    async fn sample_question_ids(
        &self,
        bank_id: QuestionBankId,
        n: usize,
    ) -> Result<Vec<QuestionId>, StorageError> {
        let rows = sqlx::query("SELECT id FROM questions WHERE bank_id = ?1")
            .bind(bank_id_to_i64(bank_id)?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut pool = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row
                .try_get("id")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            pool.push(question_id_from_i64(id)?);
        }
        tracing::debug!(bank = %bank_id, pool = pool.len(), n, "sampling question ids");
        Ok(sample_distinct(pool, n, &mut rand::rng()))
    }

    async fn questions_with_options(
        &self,
        ids: &[QuestionId],
    ) -> Result<Vec<QuestionWithOptions>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut bound = Vec::with_capacity(ids.len());
        for id in ids {
            bound.push(question_id_to_i64(*id)?);
        }

        let question_sql = format!(
            "SELECT id, content, question_type FROM questions WHERE id IN ({})",
            placeholders(1, ids.len())
        );
        let mut q = sqlx::query(&question_sql);
        for id in &bound {
            q = q.bind(*id);
        }
        let question_rows = q.fetch_all(&self.pool).await.map_err(conn)?;

        let option_sql = format!(
            r"
            SELECT question_id, id, content, is_correct
            FROM question_options
            WHERE question_id IN ({})
            ORDER BY question_id ASC, position ASC
            ",
            placeholders(1, ids.len())
        );
        let mut q = sqlx::query(&option_sql);
        for id in &bound {
            q = q.bind(*id);
        }
        let option_rows = q.fetch_all(&self.pool).await.map_err(conn)?;

        let mut options: HashMap<QuestionId, Vec<OptionView>> = HashMap::new();
        for row in option_rows {
            let (question_id, option) = map_option_row(&row)?;
            options.entry(question_id).or_default().push(option);
        }

        let mut fetched = Vec::with_capacity(question_rows.len());
        for row in question_rows {
            let (question_id, content, question_type) = map_question_row(&row)?;
            fetched.push(QuestionWithOptions {
                question_id,
                content,
                question_type,
                options: options.remove(&question_id).unwrap_or_default(),
            });
        }

        Ok(order_by_request(ids, fetched))
    }
}

#[async_trait::async_trait]
impl QuestionBankRepository for SqliteRepository {
    async fn upsert_bank(&self, bank_id: QuestionBankId, name: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO question_banks (id, name)
            VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            ",
        )
        .bind(bank_id_to_i64(bank_id)?)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn upsert_question(
        &self,
        bank_id: QuestionBankId,
        question: &QuestionWithOptions,
    ) -> Result<(), StorageError> {
        question.validate()?;
        let bank = bank_id_to_i64(bank_id)?;
        let question_id = question_id_to_i64(question.question_id)?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        let exists = sqlx::query("SELECT 1 FROM question_banks WHERE id = ?1")
            .bind(bank)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        sqlx::query(
            r"
            INSERT INTO questions (id, bank_id, content, question_type)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                bank_id = excluded.bank_id,
                content = excluded.content,
                question_type = excluded.question_type
            ",
        )
        .bind(question_id)
        .bind(bank)
        .bind(question.content.clone())
        .bind(question.question_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM question_options WHERE question_id = ?1")
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, option) in question.options.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO question_options (question_id, id, position, content, is_correct)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(question_id)
            .bind(u64_to_i64("option_id", option.option_id.value())?)
            .bind(i64::try_from(position).map_err(|_| {
                StorageError::Serialization("option position overflow".into())
            })?)
            .bind(option.content.clone())
            .bind(option.is_correct)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
