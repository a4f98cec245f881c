//! Read access to persisted responses.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Response;

/// Repository interface for reading responses.
///
/// Writes go through [`super::SubmissionStore`] so they share a transaction
/// with the completion update.
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// All nomination rows of a survey whose respondent is one of `respondents`.
    async fn list_nominations(&self, survey_id: Uuid, respondents: &[Uuid]) -> DomainResult<Vec<Response>>;

    /// All rows one respondent has for a survey.
    async fn list_for_respondent(&self, survey_id: Uuid, respondent_id: Uuid) -> DomainResult<Vec<Response>>;

    /// Ids of the distinct questions a respondent has answered.
    async fn answered_questions(&self, survey_id: Uuid, respondent_id: Uuid) -> DomainResult<Vec<Uuid>>;
}
