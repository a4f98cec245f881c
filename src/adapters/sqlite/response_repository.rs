//! SQLite implementation of the ResponseRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_optional_uuid, parse_u32, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Response;
use crate::domain::ports::ResponseRepository;

pub(crate) const RESPONSE_COLUMNS: &str =
    "id, survey_id, respondent_id, question_id, target_id, rank, score, option_id, text, created_at";

#[derive(Clone)]
pub struct SqliteResponseRepository {
    pool: SqlitePool,
}

impl SqliteResponseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseRepository for SqliteResponseRepository {
    async fn list_nominations(&self, survey_id: Uuid, respondents: &[Uuid]) -> DomainResult<Vec<Response>> {
        if respondents.is_empty() {
            return Ok(Vec::new());
        }

        // One query for the whole cohort; grouping happens in memory.
        let placeholders = vec!["?"; respondents.len()].join(", ");
        let query = format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses
             WHERE survey_id = ? AND target_id IS NOT NULL AND respondent_id IN ({placeholders})
             ORDER BY respondent_id, question_id, rank"
        );

        let mut q = sqlx::query_as::<_, ResponseRow>(&query).bind(survey_id.to_string());
        for respondent in respondents {
            q = q.bind(respondent.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(Response::try_from).collect()
    }

    async fn list_for_respondent(&self, survey_id: Uuid, respondent_id: Uuid) -> DomainResult<Vec<Response>> {
        let rows: Vec<ResponseRow> = sqlx::query_as(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses WHERE survey_id = ? AND respondent_id = ?
             ORDER BY question_id, rank"
        ))
        .bind(survey_id.to_string())
        .bind(respondent_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Response::try_from).collect()
    }

    async fn answered_questions(&self, survey_id: Uuid, respondent_id: Uuid) -> DomainResult<Vec<Uuid>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT question_id FROM responses WHERE survey_id = ? AND respondent_id = ?"
        )
        .bind(survey_id.to_string())
        .bind(respondent_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ResponseRow {
    id: String,
    survey_id: String,
    respondent_id: String,
    question_id: String,
    target_id: Option<String>,
    rank: Option<i64>,
    score: Option<i64>,
    option_id: Option<String>,
    text: Option<String>,
    created_at: String,
}

impl TryFrom<ResponseRow> for Response {
    type Error = DomainError;

    fn try_from(row: ResponseRow) -> Result<Self, Self::Error> {
        Ok(Response {
            id: parse_uuid(&row.id)?,
            survey_id: parse_uuid(&row.survey_id)?,
            respondent_id: parse_uuid(&row.respondent_id)?,
            question_id: parse_uuid(&row.question_id)?,
            target_id: parse_optional_uuid(row.target_id)?,
            rank: row.rank.map(|r| parse_u32(r, "rank")).transpose()?,
            score: row.score.map(|s| parse_u32(s, "score")).transpose()?,
            option_id: parse_optional_uuid(row.option_id)?,
            text: row.text,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}
