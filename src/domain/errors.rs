//! Domain errors for the sociogram core.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Broad class of a [`DomainError`], used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The submitted answers are malformed; resubmit a corrected batch.
    Validation,
    /// The request is well formed but the current state forbids it.
    State,
    /// An id does not resolve to a known entity.
    Reference,
    /// Persistence or serialization failure.
    Storage,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::State => write!(f, "state"),
            Self::Reference => write!(f, "reference"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

/// Why a single answer in a batch was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum AnswerErrorReason {
    QuestionNotInSurvey,
    DuplicateQuestion,
    SelectionCountMismatch { expected: u32, actual: usize },
    SelfNomination,
    TargetsNotInCohort { targets: Vec<Uuid> },
    DuplicateTarget { target: Uuid },
    DuplicateRank { rank: u32 },
    RankOutOfRange { rank: u32, max: u32 },
    MissingOption,
    UnknownOption { option: Uuid },
    MissingText,
}

impl fmt::Display for AnswerErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuestionNotInSurvey => write!(f, "question does not belong to this survey"),
            Self::DuplicateQuestion => write!(f, "question answered more than once in the same submission"),
            Self::SelectionCountMismatch { expected, actual } => {
                write!(f, "exactly {expected} selection(s) required, got {actual}")
            }
            Self::SelfNomination => write!(f, "respondent cannot nominate themselves"),
            Self::TargetsNotInCohort { targets } => {
                let ids = targets.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                write!(f, "targets are not members of the cohort: {ids}")
            }
            Self::DuplicateTarget { target } => write!(f, "target {target} selected more than once"),
            Self::DuplicateRank { rank } => write!(f, "rank {rank} assigned more than once"),
            Self::RankOutOfRange { rank, max } => write!(f, "rank {rank} outside 1..={max}"),
            Self::MissingOption => write!(f, "an option must be chosen"),
            Self::UnknownOption { option } => write!(f, "option {option} does not belong to the question"),
            Self::MissingText => write!(f, "a non-empty text answer is required"),
        }
    }
}

/// A validation problem tied to one question of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerError {
    pub question_id: Uuid,
    pub reason: AnswerErrorReason,
}

impl AnswerError {
    pub fn new(question_id: Uuid, reason: AnswerErrorReason) -> Self {
        Self { question_id, reason }
    }
}

impl fmt::Display for AnswerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "question {}: {}", self.question_id, self.reason)
    }
}

fn format_answer_errors(errors: &[AnswerError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Domain-level errors that can occur in the sociogram core.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Survey not found: {0}")]
    SurveyNotFound(Uuid),

    #[error("Cohort {cohort_id} is not assigned to survey {survey_id}")]
    CohortNotFound { survey_id: Uuid, cohort_id: Uuid },

    #[error("Invalid survey definition: {0}")]
    InvalidSurvey(String),

    #[error("Question {0} already has responses and cannot be modified")]
    QuestionLocked(Uuid),

    #[error("Survey {0} is not open for responses")]
    SurveyClosed(Uuid),

    #[error("Member {member_id} is not an eligible member of cohort {cohort_id}")]
    NotCohortMember { member_id: Uuid, cohort_id: Uuid },

    #[error("Member {respondent_id} already completed survey {survey_id}")]
    AlreadyCompleted { survey_id: Uuid, respondent_id: Uuid },

    #[error("Submission contains no answers")]
    EmptySubmission,

    #[error("Submission rejected: {}", format_answer_errors(.0))]
    ValidationFailed(Vec<AnswerError>),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptySubmission | Self::ValidationFailed(_) | Self::InvalidSurvey(_) => {
                ErrorCategory::Validation
            }
            Self::SurveyClosed(_)
            | Self::NotCohortMember { .. }
            | Self::AlreadyCompleted { .. }
            | Self::QuestionLocked(_) => ErrorCategory::State,
            Self::SurveyNotFound(_) | Self::CohortNotFound { .. } => ErrorCategory::Reference,
            Self::DatabaseError(_) | Self::SerializationError(_) => ErrorCategory::Storage,
        }
    }

    /// Per-question problems, empty for anything but a rejected batch.
    pub fn answer_errors(&self) -> &[AnswerError] {
        match self {
            Self::ValidationFailed(errors) => errors,
            _ => &[],
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_taxonomy() {
        let id = Uuid::new_v4();
        assert_eq!(DomainError::ValidationFailed(vec![]).category(), ErrorCategory::Validation);
        assert_eq!(DomainError::SurveyClosed(id).category(), ErrorCategory::State);
        assert_eq!(
            DomainError::AlreadyCompleted { survey_id: id, respondent_id: id }.category(),
            ErrorCategory::State
        );
        assert_eq!(DomainError::SurveyNotFound(id).category(), ErrorCategory::Reference);
        assert_eq!(DomainError::DatabaseError("x".into()).category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_validation_message_lists_every_question() {
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let err = DomainError::ValidationFailed(vec![
            AnswerError::new(q1, AnswerErrorReason::SelfNomination),
            AnswerError::new(q2, AnswerErrorReason::MissingText),
        ]);

        let message = err.to_string();
        assert!(message.contains(&q1.to_string()));
        assert!(message.contains(&q2.to_string()));
        assert_eq!(err.answer_errors().len(), 2);
    }

    #[test]
    fn test_reason_serializes_with_code() {
        let reason = AnswerErrorReason::SelectionCountMismatch { expected: 3, actual: 2 };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["code"], "selection_count_mismatch");
        assert_eq!(json["expected"], 3);
    }
}
