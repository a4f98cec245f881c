//! Completion tracking per respondent and cohort.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CohortProgress, CohortSnapshot, CompletionKey, CompletionState, RespondentProgress, Survey,
};
use crate::domain::ports::{CompletionRepository, ResponseRepository, SurveyRepository};

/// Apply the progress rule to an existing record, or to a fresh pending one.
///
/// Returns the record and whether it has to be written.
pub fn recompute_state(
    existing: Option<CompletionState>,
    key: CompletionKey,
    answered: usize,
    total: usize,
    now: DateTime<Utc>,
) -> (CompletionState, bool) {
    let is_new = existing.is_none();
    let mut state = existing.unwrap_or_else(|| CompletionState::pending(key, now));
    let changed = state.apply_progress(answered, total, now);
    (state, changed || is_new)
}

pub struct CompletionTracker<S, R, C>
where
    S: SurveyRepository,
    R: ResponseRepository,
    C: CompletionRepository,
{
    surveys: Arc<S>,
    responses: Arc<R>,
    completions: Arc<C>,
}

impl<S, R, C> CompletionTracker<S, R, C>
where
    S: SurveyRepository,
    R: ResponseRepository,
    C: CompletionRepository,
{
    pub fn new(surveys: Arc<S>, responses: Arc<R>, completions: Arc<C>) -> Self {
        Self { surveys, responses, completions }
    }

    async fn load_survey(&self, survey_id: Uuid) -> DomainResult<Survey> {
        self.surveys
            .get_survey(survey_id)
            .await?
            .ok_or(DomainError::SurveyNotFound(survey_id))
    }

    async fn load_snapshot(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<CohortSnapshot> {
        self.surveys
            .get_cohort_snapshot(survey_id, cohort_id)
            .await?
            .ok_or(DomainError::CohortNotFound { survey_id, cohort_id })
    }

    async fn answered_count(&self, survey: &Survey, respondent_id: Uuid) -> DomainResult<usize> {
        let answered = self.responses.answered_questions(survey.id, respondent_id).await?;
        Ok(answered.iter().filter(|id| survey.question(**id).is_some()).count())
    }

    /// Recompute and persist one respondent's record from the stored responses.
    #[instrument(skip_all, fields(survey_id = %key.survey_id, respondent_id = %key.respondent_id))]
    pub async fn recompute(&self, key: CompletionKey) -> DomainResult<CompletionState> {
        self.recompute_at(key, Utc::now()).await
    }

    pub async fn recompute_at(&self, key: CompletionKey, now: DateTime<Utc>) -> DomainResult<CompletionState> {
        let survey = self.load_survey(key.survey_id).await?;
        let answered = self.answered_count(&survey, key.respondent_id).await?;
        let existing = self.completions.get(key).await?;

        let (state, dirty) = recompute_state(existing, key, answered, survey.questions.len(), now);
        if dirty {
            self.completions.upsert(&state).await?;
            tracing::debug!(status = state.status.as_str(), progress = state.progress, "Completion updated");
        }
        Ok(state)
    }

    /// Answered and total counts with the stored record; nothing is written.
    pub async fn respondent_progress(&self, key: CompletionKey) -> DomainResult<RespondentProgress> {
        let survey = self.load_survey(key.survey_id).await?;
        let answered_questions = self.answered_count(&survey, key.respondent_id).await?;
        let state = self
            .completions
            .get(key)
            .await?
            .unwrap_or_else(|| CompletionState::pending(key, Utc::now()));

        Ok(RespondentProgress {
            answered_questions,
            total_questions: survey.questions.len(),
            state,
        })
    }

    /// Tallies over the cohort snapshot. Members without a record count as pending.
    pub async fn cohort_progress(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<CohortProgress> {
        self.load_survey(survey_id).await?;
        let snapshot = self.load_snapshot(survey_id, cohort_id).await?;
        let mut stored: HashMap<Uuid, CompletionState> = self
            .completions
            .list_for_cohort(survey_id, cohort_id)
            .await?
            .into_iter()
            .map(|s| (s.respondent_id, s))
            .collect();

        let now = Utc::now();
        let states: Vec<CompletionState> = snapshot
            .members()
            .iter()
            .map(|member| {
                stored
                    .remove(&member.id)
                    .unwrap_or_else(|| CompletionState::pending(CompletionKey::new(survey_id, member.id, cohort_id), now))
            })
            .collect();

        Ok(CohortProgress::tally(survey_id, cohort_id, &states))
    }

    /// Seed pending records for every cohort member that has none.
    #[instrument(skip_all, fields(survey_id = %survey_id, cohort_id = %cohort_id))]
    pub async fn open_for_cohort(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<usize> {
        self.load_survey(survey_id).await?;
        let snapshot = self.load_snapshot(survey_id, cohort_id).await?;
        let member_ids: Vec<Uuid> = snapshot.members().iter().map(|m| m.id).collect();

        let created = self
            .completions
            .create_missing(survey_id, cohort_id, &member_ids, Utc::now())
            .await?;
        tracing::info!(created, members = member_ids.len(), "Opened survey for cohort");
        Ok(created)
    }
}
