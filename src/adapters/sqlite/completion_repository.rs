//! SQLite implementation of the CompletionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{parse_datetime, parse_optional_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CompletionKey, CompletionState, CompletionStatus};
use crate::domain::ports::CompletionRepository;

pub(crate) const COMPLETION_COLUMNS: &str =
    "survey_id, respondent_id, cohort_id, status, progress, started_at, completed_at, updated_at";

#[derive(Clone)]
pub struct SqliteCompletionRepository {
    pool: SqlitePool,
}

impl SqliteCompletionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Insert or overwrite one completion record through any executor.
pub(crate) async fn upsert_completion<'e, E>(executor: E, state: &CompletionState) -> DomainResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"INSERT INTO completion_states (survey_id, respondent_id, cohort_id, status, progress,
                                          started_at, completed_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(survey_id, respondent_id, cohort_id) DO UPDATE SET
               status = excluded.status,
               progress = excluded.progress,
               started_at = excluded.started_at,
               completed_at = excluded.completed_at,
               updated_at = excluded.updated_at"#,
    )
    .bind(state.survey_id.to_string())
    .bind(state.respondent_id.to_string())
    .bind(state.cohort_id.to_string())
    .bind(state.status.as_str())
    .bind(state.progress)
    .bind(state.started_at.map(|t| t.to_rfc3339()))
    .bind(state.completed_at.map(|t| t.to_rfc3339()))
    .bind(state.updated_at.to_rfc3339())
    .execute(executor)
    .await?;

    Ok(())
}

/// Fetch one completion record through any executor.
pub(crate) async fn fetch_completion<'e, E>(executor: E, key: CompletionKey) -> DomainResult<Option<CompletionState>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<CompletionRow> = sqlx::query_as(&format!(
        "SELECT {COMPLETION_COLUMNS} FROM completion_states
         WHERE survey_id = ? AND respondent_id = ? AND cohort_id = ?"
    ))
    .bind(key.survey_id.to_string())
    .bind(key.respondent_id.to_string())
    .bind(key.cohort_id.to_string())
    .fetch_optional(executor)
    .await?;

    row.map(CompletionState::try_from).transpose()
}

#[async_trait]
impl CompletionRepository for SqliteCompletionRepository {
    async fn get(&self, key: CompletionKey) -> DomainResult<Option<CompletionState>> {
        fetch_completion(&self.pool, key).await
    }

    async fn upsert(&self, state: &CompletionState) -> DomainResult<()> {
        upsert_completion(&self.pool, state).await
    }

    async fn list_for_cohort(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<Vec<CompletionState>> {
        let rows: Vec<CompletionRow> = sqlx::query_as(&format!(
            "SELECT {COMPLETION_COLUMNS} FROM completion_states
             WHERE survey_id = ? AND cohort_id = ?
             ORDER BY respondent_id"
        ))
        .bind(survey_id.to_string())
        .bind(cohort_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CompletionState::try_from).collect()
    }

    async fn create_missing(
        &self,
        survey_id: Uuid,
        cohort_id: Uuid,
        member_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> DomainResult<usize> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;

        for member_id in member_ids {
            let result = sqlx::query(
                r#"INSERT OR IGNORE INTO completion_states
                       (survey_id, respondent_id, cohort_id, status, progress, updated_at)
                   VALUES (?, ?, ?, 'pending', 0, ?)"#,
            )
            .bind(survey_id.to_string())
            .bind(member_id.to_string())
            .bind(cohort_id.to_string())
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await?;
            created += result.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(created)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CompletionRow {
    survey_id: String,
    respondent_id: String,
    cohort_id: String,
    status: String,
    progress: f64,
    started_at: Option<String>,
    completed_at: Option<String>,
    updated_at: String,
}

impl TryFrom<CompletionRow> for CompletionState {
    type Error = DomainError;

    fn try_from(row: CompletionRow) -> Result<Self, Self::Error> {
        let status = CompletionStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid completion status: {}", row.status)))?;

        Ok(CompletionState {
            survey_id: parse_uuid(&row.survey_id)?,
            respondent_id: parse_uuid(&row.respondent_id)?,
            cohort_id: parse_uuid(&row.cohort_id)?,
            status,
            progress: row.progress,
            started_at: parse_optional_datetime(row.started_at)?,
            completed_at: parse_optional_datetime(row.completed_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteSurveyRepository};
    use crate::domain::models::{Cohort, Member, Question, Survey};
    use crate::domain::ports::SurveyRepository;
    use chrono::Duration;

    async fn setup() -> (SqliteCompletionRepository, Uuid, Uuid, Vec<Uuid>) {
        let pool = create_migrated_test_pool().await.unwrap();
        let surveys = SqliteSurveyRepository::new(pool.clone());

        let now = Utc::now();
        let survey = Survey::new("Climate", now - Duration::days(1), now + Duration::days(1))
            .with_question(Question::free_text(1, "Anything?"));
        surveys.save_survey(&survey).await.unwrap();

        let members: Vec<Member> = ["Ana", "Bruno"].iter().map(|n| Member::new(*n, *n)).collect();
        for m in &members {
            surveys.save_member(m).await.unwrap();
        }
        let cohort = Cohort::new("1A").with_members(members.iter().map(|m| m.id));
        surveys.save_cohort(&cohort).await.unwrap();

        let ids = members.iter().map(|m| m.id).collect();
        (SqliteCompletionRepository::new(pool), survey.id, cohort.id, ids)
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let (repo, survey_id, cohort_id, members) = setup().await;
        let key = CompletionKey::new(survey_id, members[0], cohort_id);
        let now = Utc::now();

        let mut state = CompletionState::pending(key, now);
        repo.upsert(&state).await.unwrap();

        state.apply_progress(1, 1, now);
        repo.upsert(&state).await.unwrap();

        let stored = repo.get(key).await.unwrap().unwrap();
        assert_eq!(stored.status, CompletionStatus::Completed);
        assert!((stored.progress - 100.0).abs() < f64::EPSILON);
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_create_missing_only_adds_new_rows() {
        let (repo, survey_id, cohort_id, members) = setup().await;
        let now = Utc::now();

        let mut started = CompletionState::pending(CompletionKey::new(survey_id, members[0], cohort_id), now);
        started.apply_progress(1, 2, now);
        repo.upsert(&started).await.unwrap();

        let created = repo.create_missing(survey_id, cohort_id, &members, now).await.unwrap();
        assert_eq!(created, 1);

        let all = repo.list_for_cohort(survey_id, cohort_id).await.unwrap();
        assert_eq!(all.len(), 2);
        let kept = all.iter().find(|s| s.respondent_id == members[0]).unwrap();
        assert_eq!(kept.status, CompletionStatus::InProgress);

        assert_eq!(repo.create_missing(survey_id, cohort_id, &members, now).await.unwrap(), 0);
    }
}
