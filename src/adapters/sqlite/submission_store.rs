//! Transactional write path backed by a SQLite transaction.

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::completion_repository::{fetch_completion, upsert_completion};
use crate::domain::errors::DomainResult;
use crate::domain::models::{CompletionKey, CompletionState, Response};
use crate::domain::ports::{SubmissionStore, SubmissionTransaction};

#[derive(Clone)]
pub struct SqliteSubmissionStore {
    pool: SqlitePool,
}

impl SqliteSubmissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for SqliteSubmissionStore {
    async fn begin(&self) -> DomainResult<Box<dyn SubmissionTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteSubmissionTransaction { tx }))
    }
}

/// One open submission. Dropping it without `commit` rolls back.
pub struct SqliteSubmissionTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl SubmissionTransaction for SqliteSubmissionTransaction {
    async fn lock_completion(&mut self, key: CompletionKey) -> DomainResult<Option<CompletionState>> {
        // A write as first statement upgrades the deferred transaction to the
        // database write lock, so the read below cannot go stale.
        sqlx::query(
            "UPDATE completion_states SET updated_at = updated_at
             WHERE survey_id = ? AND respondent_id = ? AND cohort_id = ?",
        )
        .bind(key.survey_id.to_string())
        .bind(key.respondent_id.to_string())
        .bind(key.cohort_id.to_string())
        .execute(&mut *self.tx)
        .await?;

        fetch_completion(&mut *self.tx, key).await
    }

    async fn replace_answers(
        &mut self,
        survey_id: Uuid,
        respondent_id: Uuid,
        question_id: Uuid,
        rows: &[Response],
    ) -> DomainResult<usize> {
        sqlx::query("DELETE FROM responses WHERE survey_id = ? AND respondent_id = ? AND question_id = ?")
            .bind(survey_id.to_string())
            .bind(respondent_id.to_string())
            .bind(question_id.to_string())
            .execute(&mut *self.tx)
            .await?;

        for row in rows {
            sqlx::query(
                r#"INSERT INTO responses (id, survey_id, respondent_id, question_id, target_id, rank, score,
                                          option_id, text, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(row.id.to_string())
            .bind(row.survey_id.to_string())
            .bind(row.respondent_id.to_string())
            .bind(row.question_id.to_string())
            .bind(row.target_id.map(|id| id.to_string()))
            .bind(row.rank.map(i64::from))
            .bind(row.score.map(i64::from))
            .bind(row.option_id.map(|id| id.to_string()))
            .bind(&row.text)
            .bind(row.created_at.to_rfc3339())
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(rows.len())
    }

    async fn answered_question_count(&mut self, survey_id: Uuid, respondent_id: Uuid) -> DomainResult<usize> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT question_id) FROM responses WHERE survey_id = ? AND respondent_id = ?",
        )
        .bind(survey_id.to_string())
        .bind(respondent_id.to_string())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn save_completion(&mut self, state: &CompletionState) -> DomainResult<()> {
        upsert_completion(&mut *self.tx, state).await
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
