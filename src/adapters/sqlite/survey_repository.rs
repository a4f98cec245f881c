//! SQLite implementation of the SurveyRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{parse_datetime, parse_json_or_default, parse_u32, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChoiceOption, Cohort, CohortSnapshot, Member, Polarity, Question, QuestionKind, Survey};
use crate::domain::ports::SurveyRepository;

const QUESTION_COLUMNS: &str =
    "id, survey_id, position, text, description, kind, polarity, max_selections, options";

#[derive(Clone)]
pub struct SqliteSurveyRepository {
    pool: SqlitePool,
}

impl SqliteSurveyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_question(tx: &mut Transaction<'static, Sqlite>, id: Uuid) -> DomainResult<Option<(Uuid, Question)>> {
        let row: Option<QuestionRow> = sqlx::query_as(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await?;

        row.map(|r| {
            let survey_id = parse_uuid(&r.survey_id)?;
            Ok((survey_id, Question::try_from(r)?))
        })
        .transpose()
    }

    async fn has_responses(tx: &mut Transaction<'static, Sqlite>, question_id: Uuid) -> DomainResult<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM responses WHERE question_id = ?")
            .bind(question_id.to_string())
            .fetch_one(&mut **tx)
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl SurveyRepository for SqliteSurveyRepository {
    async fn get_survey(&self, id: Uuid) -> DomainResult<Option<Survey>> {
        let row: Option<SurveyRow> = sqlx::query_as(
            "SELECT id, title, description, starts_at, ends_at, active FROM surveys WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let question_rows: Vec<QuestionRow> = sqlx::query_as(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE survey_id = ? ORDER BY position, id"
        ))
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let questions = question_rows
            .into_iter()
            .map(Question::try_from)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Some(Survey {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            starts_at: parse_datetime(&row.starts_at)?,
            ends_at: parse_datetime(&row.ends_at)?,
            active: row.active,
            questions,
        }))
    }

    async fn get_cohort_snapshot(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<Option<CohortSnapshot>> {
        let label: Option<(String,)> = sqlx::query_as(
            r#"SELECT c.label FROM cohorts c
               JOIN survey_cohorts sc ON sc.cohort_id = c.id
               WHERE sc.survey_id = ? AND c.id = ?"#
        )
        .bind(survey_id.to_string())
        .bind(cohort_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some((label,)) = label else {
            return Ok(None);
        };

        let rows: Vec<MemberRow> = sqlx::query_as(
            r#"SELECT m.id, m.code, m.display_name FROM cohort_members cm
               JOIN members m ON m.id = cm.member_id
               WHERE cm.cohort_id = ? AND cm.active = 1
               ORDER BY m.display_name, m.code"#
        )
        .bind(cohort_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let members = rows.into_iter().map(Member::try_from).collect::<DomainResult<Vec<_>>>()?;
        Ok(Some(CohortSnapshot::new(survey_id, cohort_id, label, members)))
    }

    async fn list_survey_cohorts(&self, survey_id: Uuid) -> DomainResult<Vec<Uuid>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT cohort_id FROM survey_cohorts WHERE survey_id = ? ORDER BY cohort_id"
        )
        .bind(survey_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }

    async fn save_member(&self, member: &Member) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO members (id, code, display_name, created_at) VALUES (?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET code = excluded.code, display_name = excluded.display_name"#
        )
        .bind(member.id.to_string())
        .bind(&member.code)
        .bind(&member.display_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_cohort(&self, cohort: &Cohort) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO cohorts (id, label, created_at) VALUES (?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET label = excluded.label"#
        )
        .bind(cohort.id.to_string())
        .bind(&cohort.label)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        // Former members stay on record as inactive.
        sqlx::query("UPDATE cohort_members SET active = 0 WHERE cohort_id = ?")
            .bind(cohort.id.to_string())
            .execute(&mut *tx)
            .await?;

        for member_id in &cohort.member_ids {
            sqlx::query(
                r#"INSERT INTO cohort_members (cohort_id, member_id, active) VALUES (?, ?, 1)
                   ON CONFLICT(cohort_id, member_id) DO UPDATE SET active = 1"#
            )
            .bind(cohort.id.to_string())
            .bind(member_id.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_survey(&self, survey: &Survey) -> DomainResult<()> {
        survey.validate().map_err(DomainError::InvalidSurvey)?;
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO surveys (id, title, description, starts_at, ends_at, active, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET title = excluded.title, description = excluded.description,
                   starts_at = excluded.starts_at, ends_at = excluded.ends_at, active = excluded.active,
                   updated_at = excluded.updated_at"#
        )
        .bind(survey.id.to_string())
        .bind(&survey.title)
        .bind(&survey.description)
        .bind(survey.starts_at.to_rfc3339())
        .bind(survey.ends_at.to_rfc3339())
        .bind(survey.active)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for question in &survey.questions {
            if let Some((owner, existing)) = Self::load_question(&mut tx, question.id).await? {
                let unchanged = owner == survey.id && &existing == question;
                if !unchanged && Self::has_responses(&mut tx, question.id).await? {
                    return Err(DomainError::QuestionLocked(question.id));
                }
            }

            let columns = QuestionColumns::from(question);
            sqlx::query(
                r#"INSERT INTO questions (id, survey_id, position, text, description, kind, polarity, max_selections, options)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                   ON CONFLICT(id) DO UPDATE SET survey_id = excluded.survey_id, position = excluded.position,
                       text = excluded.text, description = excluded.description, kind = excluded.kind,
                       polarity = excluded.polarity, max_selections = excluded.max_selections,
                       options = excluded.options"#
            )
            .bind(question.id.to_string())
            .bind(survey.id.to_string())
            .bind(i64::from(question.position))
            .bind(&question.text)
            .bind(&question.description)
            .bind(question.kind.as_str())
            .bind(columns.polarity)
            .bind(columns.max_selections)
            .bind(columns.options)
            .execute(&mut *tx)
            .await?;
        }

        // Questions dropped from the survey go away unless answered.
        let stored: Vec<(String,)> = sqlx::query_as("SELECT id FROM questions WHERE survey_id = ?")
            .bind(survey.id.to_string())
            .fetch_all(&mut *tx)
            .await?;
        for (id,) in stored {
            let id = parse_uuid(&id)?;
            if survey.question(id).is_some() {
                continue;
            }
            if Self::has_responses(&mut tx, id).await? {
                return Err(DomainError::QuestionLocked(id));
            }
            sqlx::query("DELETE FROM questions WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn assign_cohort(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<()> {
        sqlx::query("INSERT OR IGNORE INTO survey_cohorts (survey_id, cohort_id) VALUES (?, ?)")
            .bind(survey_id.to_string())
            .bind(cohort_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Kind-specific question columns.
struct QuestionColumns {
    polarity: Option<&'static str>,
    max_selections: Option<i64>,
    options: Option<String>,
}

impl From<&Question> for QuestionColumns {
    fn from(question: &Question) -> Self {
        match &question.kind {
            QuestionKind::Nomination { polarity, max_selections } => Self {
                polarity: Some(polarity.as_str()),
                max_selections: Some(i64::from(*max_selections)),
                options: None,
            },
            QuestionKind::SingleChoice { options } => Self {
                polarity: None,
                max_selections: None,
                options: serde_json::to_string(options).ok(),
            },
            QuestionKind::FreeText => Self { polarity: None, max_selections: None, options: None },
        }
    }
}

#[derive(sqlx::FromRow)]
struct SurveyRow {
    id: String,
    title: String,
    description: Option<String>,
    starts_at: String,
    ends_at: String,
    active: bool,
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: String,
    survey_id: String,
    position: i64,
    text: String,
    description: Option<String>,
    kind: String,
    polarity: Option<String>,
    max_selections: Option<i64>,
    options: Option<String>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = DomainError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            "nomination" => {
                let polarity = row
                    .polarity
                    .as_deref()
                    .map_or(Some(Polarity::Positive), Polarity::from_str)
                    .ok_or_else(|| DomainError::SerializationError(format!("Invalid polarity: {:?}", row.polarity)))?;
                let max_selections = row
                    .max_selections
                    .ok_or_else(|| DomainError::SerializationError(format!("Question {} lacks max_selections", row.id)))?;
                QuestionKind::Nomination {
                    polarity,
                    max_selections: parse_u32(max_selections, "max_selections")?,
                }
            }
            "single_choice" => QuestionKind::SingleChoice {
                options: parse_json_or_default::<Vec<ChoiceOption>>(row.options)?,
            },
            "free_text" => QuestionKind::FreeText,
            other => return Err(DomainError::SerializationError(format!("Invalid question kind: {other}"))),
        };

        Ok(Question {
            id: parse_uuid(&row.id)?,
            position: parse_u32(row.position, "position")?,
            text: row.text,
            kind,
            description: row.description,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: String,
    code: String,
    display_name: String,
}

impl TryFrom<MemberRow> for Member {
    type Error = DomainError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Member {
            id: parse_uuid(&row.id)?,
            code: row.code,
            display_name: row.display_name,
        })
    }
}
