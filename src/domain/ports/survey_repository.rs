//! Survey and cohort reference-data port.
//!
//! The catalog collaborator owns this data; the core reads it and the
//! catalog writes it through the `save_*` operations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Cohort, CohortSnapshot, Member, Survey};

/// Repository interface for surveys, members and cohorts.
#[async_trait]
pub trait SurveyRepository: Send + Sync {
    /// Get a survey with its questions ordered by position.
    async fn get_survey(&self, id: Uuid) -> DomainResult<Option<Survey>>;

    /// Freeze the active membership of a cohort assigned to a survey.
    ///
    /// Returns `None` when the cohort is unknown or not assigned to the survey.
    async fn get_cohort_snapshot(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<Option<CohortSnapshot>>;

    /// Ids of the cohorts assigned to a survey.
    async fn list_survey_cohorts(&self, survey_id: Uuid) -> DomainResult<Vec<Uuid>>;

    /// Insert or update a member.
    async fn save_member(&self, member: &Member) -> DomainResult<()>;

    /// Insert or update a cohort and replace its membership.
    async fn save_cohort(&self, cohort: &Cohort) -> DomainResult<()>;

    /// Insert or update a survey and its questions.
    ///
    /// Fails with `QuestionLocked` when a question that already has responses
    /// would change.
    async fn save_survey(&self, survey: &Survey) -> DomainResult<()>;

    /// Make a cohort eligible for a survey.
    async fn assign_cohort(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<()>;
}
