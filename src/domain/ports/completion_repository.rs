//! Completion state port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CompletionKey, CompletionState};

/// Repository interface for completion records.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    async fn get(&self, key: CompletionKey) -> DomainResult<Option<CompletionState>>;

    /// Insert or replace a record.
    async fn upsert(&self, state: &CompletionState) -> DomainResult<()>;

    /// Records of every respondent of a cohort for a survey.
    async fn list_for_cohort(&self, survey_id: Uuid, cohort_id: Uuid) -> DomainResult<Vec<CompletionState>>;

    /// Create pending records for members that have none. Returns how many were created.
    async fn create_missing(
        &self,
        survey_id: Uuid,
        cohort_id: Uuid,
        member_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> DomainResult<usize>;
}
