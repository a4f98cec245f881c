//! Validate, write and recompute completion for one respondent's batch.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AnswerBatch, CohortSnapshot, CompletionKey, CompletionState, Member, Question, Survey, ValidatedSubmission,
};
use crate::domain::ports::{CompletionRepository, ResponseRepository, SubmissionStore, SurveyRepository};
use crate::services::completion_tracker::recompute_state;
use crate::services::response_validator::ResponseValidator;

/// Outcome of an accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Rows written across every question of the batch.
    pub saved_answers: usize,
    pub completion: CompletionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub answered: bool,
}

/// What a respondent needs to fill in the survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NominationForm {
    pub survey_id: Uuid,
    pub cohort_id: Uuid,
    pub respondent_id: Uuid,
    pub title: String,
    pub questions: Vec<FormQuestion>,
    /// Cohort members the respondent may nominate.
    pub candidates: Vec<Member>,
}

pub struct SubmissionService<S, R, C, U>
where
    S: SurveyRepository,
    R: ResponseRepository,
    C: CompletionRepository,
    U: SubmissionStore,
{
    surveys: Arc<S>,
    responses: Arc<R>,
    completions: Arc<C>,
    store: Arc<U>,
    validator: ResponseValidator,
}

impl<S, R, C, U> SubmissionService<S, R, C, U>
where
    S: SurveyRepository,
    R: ResponseRepository,
    C: CompletionRepository,
    U: SubmissionStore,
{
    pub fn new(surveys: Arc<S>, responses: Arc<R>, completions: Arc<C>, store: Arc<U>) -> Self {
        Self {
            surveys,
            responses,
            completions,
            store,
            validator: ResponseValidator::new(),
        }
    }

    async fn load(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<(Survey, CohortSnapshot)> {
        let survey = self
            .surveys
            .get_survey(survey_id)
            .await?
            .ok_or(DomainError::SurveyNotFound(survey_id))?;
        let snapshot = self
            .surveys
            .get_cohort_snapshot(survey_id, cohort_id)
            .await?
            .ok_or(DomainError::CohortNotFound { survey_id, cohort_id })?;
        Ok((survey, snapshot))
    }

    pub async fn submit(&self, batch: AnswerBatch) -> DomainResult<SubmissionReceipt> {
        self.submit_at(batch, Utc::now()).await
    }

    /// All-or-nothing: either every answer is written and completion updated, or nothing changes.
    #[instrument(skip_all, fields(survey_id = %batch.survey_id, respondent_id = %batch.respondent_id))]
    pub async fn submit_at(&self, batch: AnswerBatch, now: DateTime<Utc>) -> DomainResult<SubmissionReceipt> {
        let (survey, snapshot) = self.load(batch.survey_id, batch.cohort_id).await?;
        let key = CompletionKey::new(survey.id, batch.respondent_id, snapshot.cohort_id);
        let previous = self.completions.get(key).await?;

        let validated = match self.validator.validate(&survey, &snapshot, &batch, previous.as_ref(), now) {
            Ok(validated) => validated,
            Err(err) => {
                tracing::warn!(category = %err.category(), error = %err, "Submission rejected");
                return Err(err);
            }
        };

        let receipt = self.write(&survey, key, validated, now).await?;
        tracing::info!(
            saved_answers = receipt.saved_answers,
            status = receipt.completion.status.as_str(),
            progress = receipt.completion.progress,
            "Submission accepted"
        );
        Ok(receipt)
    }

    async fn write(
        &self,
        survey: &Survey,
        key: CompletionKey,
        validated: ValidatedSubmission,
        now: DateTime<Utc>,
    ) -> DomainResult<SubmissionReceipt> {
        let mut tx = self.store.begin().await?;

        // Re-read under the write lock: a concurrent batch may have completed the survey.
        let locked = tx.lock_completion(key).await?;
        if locked.as_ref().is_some_and(|s| s.status.is_completed()) {
            return Err(DomainError::AlreadyCompleted {
                survey_id: key.survey_id,
                respondent_id: key.respondent_id,
            });
        }

        let mut saved_answers = 0;
        for write in validated.writes {
            let rows: Vec<_> = write
                .rows
                .into_iter()
                .map(|row| row.into_response(validated.survey_id, validated.respondent_id, write.question_id, now))
                .collect();
            saved_answers += tx
                .replace_answers(validated.survey_id, validated.respondent_id, write.question_id, &rows)
                .await?;
        }

        let answered = tx.answered_question_count(key.survey_id, key.respondent_id).await?;
        let (completion, dirty) = recompute_state(locked, key, answered, survey.questions.len(), now);
        if dirty {
            tx.save_completion(&completion).await?;
        }

        tx.commit().await?;
        Ok(SubmissionReceipt { saved_answers, completion })
    }

    /// Questions in order with their answered flag, and the peers the respondent may pick.
    pub async fn nomination_form(
        &self,
        survey_id: Uuid,
        cohort_id: Uuid,
        respondent_id: Uuid,
    ) -> DomainResult<NominationForm> {
        let (survey, snapshot) = self.load(survey_id, cohort_id).await?;
        let key = CompletionKey::new(survey_id, respondent_id, cohort_id);
        let completion = self.completions.get(key).await?;
        self.validator
            .check_state(&survey, &snapshot, respondent_id, completion.as_ref(), Utc::now())?;

        let answered: HashSet<Uuid> = self
            .responses
            .answered_questions(survey_id, respondent_id)
            .await?
            .into_iter()
            .collect();

        Ok(NominationForm {
            survey_id,
            cohort_id,
            respondent_id,
            title: survey.title.clone(),
            questions: survey
                .questions
                .iter()
                .map(|q| FormQuestion {
                    question: q.clone(),
                    answered: answered.contains(&q.id),
                })
                .collect(),
            candidates: snapshot
                .members()
                .iter()
                .filter(|m| m.id != respondent_id)
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteCompletionRepository, SqliteResponseRepository, SqliteSubmissionStore,
        SqliteSurveyRepository,
    };
    use crate::domain::errors::AnswerErrorReason;
    use crate::domain::models::{Answer, Cohort, CompletionStatus, Polarity};
    use chrono::Duration;

    type Service =
        SubmissionService<SqliteSurveyRepository, SqliteResponseRepository, SqliteCompletionRepository, SqliteSubmissionStore>;

    struct Fixture {
        service: Service,
        responses: Arc<SqliteResponseRepository>,
        survey: Survey,
        cohort: Cohort,
    }

    async fn fixture() -> Fixture {
        let pool = create_migrated_test_pool().await.unwrap();
        let surveys = SqliteSurveyRepository::new(pool.clone());
        let now = Utc::now();

        let survey = Survey::new("Climate", now - Duration::days(1), now + Duration::days(1))
            .with_question(Question::nomination(1, "Work with?", Polarity::Positive, 2))
            .with_question(Question::free_text(2, "Comments?"));
        surveys.save_survey(&survey).await.unwrap();
        let members: Vec<Member> = ["A", "B", "C", "D"].iter().map(|c| Member::new(*c, *c)).collect();
        for m in &members {
            surveys.save_member(m).await.unwrap();
        }
        let cohort = Cohort::new("1A").with_members(members.iter().map(|m| m.id));
        surveys.save_cohort(&cohort).await.unwrap();
        surveys.assign_cohort(survey.id, cohort.id).await.unwrap();

        let responses = Arc::new(SqliteResponseRepository::new(pool.clone()));
        let service = SubmissionService::new(
            Arc::new(surveys),
            responses.clone(),
            Arc::new(SqliteCompletionRepository::new(pool.clone())),
            Arc::new(SqliteSubmissionStore::new(pool)),
        );
        Fixture { service, responses, survey, cohort }
    }

    fn batch(f: &Fixture, respondent: Uuid, answers: Vec<Answer>) -> AnswerBatch {
        AnswerBatch {
            survey_id: f.survey.id,
            cohort_id: f.cohort.id,
            respondent_id: respondent,
            answers,
        }
    }

    #[tokio::test]
    async fn test_partial_then_complete() {
        let f = fixture().await;
        let me = f.cohort.member_ids[0];
        let nomination = f.survey.questions[0].id;
        let text = f.survey.questions[1].id;

        let first = f
            .service
            .submit(batch(&f, me, vec![Answer::nominations(nomination, &f.cohort.member_ids[1..3])]))
            .await
            .unwrap();
        assert_eq!(first.saved_answers, 2);
        assert_eq!(first.completion.status, CompletionStatus::InProgress);

        // Resubmitting the same question replaces the earlier rows.
        f.service
            .submit(batch(&f, me, vec![Answer::nominations(nomination, &f.cohort.member_ids[2..4])]))
            .await
            .unwrap();
        let rows = f.responses.list_for_respondent(f.survey.id, me).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.target_id != Some(f.cohort.member_ids[1])));

        let done = f.service.submit(batch(&f, me, vec![Answer::text(text, "fine")])).await.unwrap();
        assert_eq!(done.completion.status, CompletionStatus::Completed);
        assert!(done.completion.completed_at.is_some());

        let again = f.service.submit(batch(&f, me, vec![Answer::text(text, "more")])).await;
        assert!(matches!(again, Err(DomainError::AlreadyCompleted { .. })));
    }

    #[tokio::test]
    async fn test_invalid_batch_writes_nothing() {
        let f = fixture().await;
        let me = f.cohort.member_ids[0];
        let nomination = f.survey.questions[0].id;
        let text = f.survey.questions[1].id;

        let err = f
            .service
            .submit(batch(
                &f,
                me,
                vec![
                    Answer::text(text, "valid on its own"),
                    Answer::nominations(nomination, &f.cohort.member_ids[1..2]),
                ],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.answer_errors().len(), 1);
        assert_eq!(
            err.answer_errors()[0].reason,
            AnswerErrorReason::SelectionCountMismatch { expected: 2, actual: 1 }
        );
        assert!(f.responses.list_for_respondent(f.survey.id, me).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let f = fixture().await;
        let mut unknown_survey = batch(&f, f.cohort.member_ids[0], vec![]);
        unknown_survey.survey_id = Uuid::new_v4();
        assert!(matches!(
            f.service.submit(unknown_survey).await,
            Err(DomainError::SurveyNotFound(_))
        ));

        let mut unknown_cohort = batch(&f, f.cohort.member_ids[0], vec![]);
        unknown_cohort.cohort_id = Uuid::new_v4();
        assert!(matches!(
            f.service.submit(unknown_cohort).await,
            Err(DomainError::CohortNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_nomination_form_excludes_respondent() {
        let f = fixture().await;
        let me = f.cohort.member_ids[0];
        f.service
            .submit(batch(&f, me, vec![Answer::text(f.survey.questions[1].id, "hi")]))
            .await
            .unwrap();

        let form = f.service.nomination_form(f.survey.id, f.cohort.id, me).await.unwrap();
        assert_eq!(form.candidates.len(), 3);
        assert!(form.candidates.iter().all(|m| m.id != me));
        assert_eq!(form.questions.iter().map(|q| q.answered).collect::<Vec<_>>(), vec![false, true]);
    }
}
