//! Unit of work for the submission flow.
//!
//! A submission replaces answers and recomputes completion inside one
//! transaction. Dropping a [`SubmissionTransaction`] without committing
//! rolls everything back.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CompletionKey, CompletionState, Response};

/// Opens transactions for the write path.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn begin(&self) -> DomainResult<Box<dyn SubmissionTransaction>>;
}

/// Operations available inside one submission transaction.
#[async_trait]
pub trait SubmissionTransaction: Send {
    /// Take the write lock for a respondent and return its completion record.
    ///
    /// Must be the first call of the transaction so concurrent submissions of
    /// the same respondent are serialized.
    async fn lock_completion(&mut self, key: CompletionKey) -> DomainResult<Option<CompletionState>>;

    /// Delete the respondent's rows for `question_id` and insert `rows`.
    async fn replace_answers(
        &mut self,
        survey_id: Uuid,
        respondent_id: Uuid,
        question_id: Uuid,
        rows: &[Response],
    ) -> DomainResult<usize>;

    /// Count of distinct questions the respondent has answered, as seen by this transaction.
    async fn answered_question_count(&mut self, survey_id: Uuid, respondent_id: Uuid) -> DomainResult<usize>;

    async fn save_completion(&mut self, state: &CompletionState) -> DomainResult<()>;

    async fn commit(self: Box<Self>) -> DomainResult<()>;
}
