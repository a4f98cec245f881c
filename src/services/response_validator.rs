//! Structural checks on a submitted answer batch.
//!
//! State checks run first and fail fast. Per-answer checks are then run over
//! the whole batch and every problem is collected, so the caller sees all of
//! them in one round trip. Nothing here touches storage.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::{AnswerError, AnswerErrorReason, DomainError, DomainResult};
use crate::domain::models::{
    Answer, AnswerBatch, CohortSnapshot, CompletionState, NewResponse, Question, QuestionKind, QuestionWrite,
    Survey, ValidatedSubmission,
};
use crate::services::scoring::nomination_score;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn new() -> Self {
        Self
    }

    /// Reject the submission outright when the survey or respondent state forbids it.
    pub fn check_state(
        &self,
        survey: &Survey,
        snapshot: &CohortSnapshot,
        respondent_id: Uuid,
        completion: Option<&CompletionState>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !survey.is_open_at(now) {
            return Err(DomainError::SurveyClosed(survey.id));
        }
        if !snapshot.contains(respondent_id) {
            return Err(DomainError::NotCohortMember {
                member_id: respondent_id,
                cohort_id: snapshot.cohort_id,
            });
        }
        if completion.is_some_and(|c| c.status.is_completed()) {
            return Err(DomainError::AlreadyCompleted {
                survey_id: survey.id,
                respondent_id,
            });
        }
        Ok(())
    }

    /// Check every answer of the batch and derive the rows to write.
    pub fn validate_answers(
        &self,
        survey: &Survey,
        snapshot: &CohortSnapshot,
        batch: &AnswerBatch,
    ) -> DomainResult<ValidatedSubmission> {
        if batch.answers.is_empty() {
            return Err(DomainError::EmptySubmission);
        }

        let mut errors = Vec::new();
        let mut writes = Vec::with_capacity(batch.answers.len());
        let mut seen_questions = HashSet::with_capacity(batch.answers.len());

        for answer in &batch.answers {
            let Some(question) = survey.question(answer.question_id) else {
                errors.push(AnswerError::new(answer.question_id, AnswerErrorReason::QuestionNotInSurvey));
                continue;
            };
            if !seen_questions.insert(question.id) {
                errors.push(AnswerError::new(question.id, AnswerErrorReason::DuplicateQuestion));
                continue;
            }

            match check_answer(question, answer, batch.respondent_id, snapshot) {
                Ok(rows) => writes.push(QuestionWrite { question_id: question.id, rows }),
                Err(reasons) => errors.extend(reasons.into_iter().map(|r| AnswerError::new(question.id, r))),
            }
        }

        if !errors.is_empty() {
            tracing::debug!(
                respondent_id = %batch.respondent_id,
                errors = errors.len(),
                "Submission failed validation"
            );
            return Err(DomainError::ValidationFailed(errors));
        }

        Ok(ValidatedSubmission {
            survey_id: survey.id,
            cohort_id: snapshot.cohort_id,
            respondent_id: batch.respondent_id,
            writes,
        })
    }

    /// State checks followed by answer checks.
    pub fn validate(
        &self,
        survey: &Survey,
        snapshot: &CohortSnapshot,
        batch: &AnswerBatch,
        completion: Option<&CompletionState>,
        now: DateTime<Utc>,
    ) -> DomainResult<ValidatedSubmission> {
        self.check_state(survey, snapshot, batch.respondent_id, completion, now)?;
        self.validate_answers(survey, snapshot, batch)
    }
}

fn check_answer(
    question: &Question,
    answer: &Answer,
    respondent_id: Uuid,
    snapshot: &CohortSnapshot,
) -> Result<Vec<NewResponse>, Vec<AnswerErrorReason>> {
    match &question.kind {
        QuestionKind::Nomination { max_selections, .. } => {
            check_nominations(answer, *max_selections, respondent_id, snapshot)
        }
        QuestionKind::SingleChoice { options } => match answer.option_id {
            None => Err(vec![AnswerErrorReason::MissingOption]),
            Some(option) if !options.iter().any(|o| o.id == option) => {
                Err(vec![AnswerErrorReason::UnknownOption { option }])
            }
            Some(option_id) => Ok(vec![NewResponse::Choice { option_id }]),
        },
        QuestionKind::FreeText => match answer.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(vec![NewResponse::Text { text: text.to_string() }]),
            _ => Err(vec![AnswerErrorReason::MissingText]),
        },
    }
}

fn check_nominations(
    answer: &Answer,
    max_selections: u32,
    respondent_id: Uuid,
    snapshot: &CohortSnapshot,
) -> Result<Vec<NewResponse>, Vec<AnswerErrorReason>> {
    let mut reasons = Vec::new();
    let selections = &answer.selections;

    if selections.len() != max_selections as usize {
        reasons.push(AnswerErrorReason::SelectionCountMismatch {
            expected: max_selections,
            actual: selections.len(),
        });
    }

    if selections.iter().any(|s| s.target_id == respondent_id) {
        reasons.push(AnswerErrorReason::SelfNomination);
    }

    let mut outsiders: Vec<Uuid> = Vec::new();
    for selection in selections {
        if !snapshot.contains(selection.target_id) && !outsiders.contains(&selection.target_id) {
            outsiders.push(selection.target_id);
        }
    }
    if !outsiders.is_empty() {
        reasons.push(AnswerErrorReason::TargetsNotInCohort { targets: outsiders });
    }

    let mut targets = HashSet::new();
    let mut reported_targets = HashSet::new();
    let mut ranks = HashSet::new();
    let mut reported_ranks = HashSet::new();
    for selection in selections {
        if !targets.insert(selection.target_id) && reported_targets.insert(selection.target_id) {
            reasons.push(AnswerErrorReason::DuplicateTarget { target: selection.target_id });
        }
        if !ranks.insert(selection.rank) && reported_ranks.insert(selection.rank) {
            reasons.push(AnswerErrorReason::DuplicateRank { rank: selection.rank });
        }
        if selection.rank == 0 || selection.rank > max_selections {
            reasons.push(AnswerErrorReason::RankOutOfRange {
                rank: selection.rank,
                max: max_selections,
            });
        }
    }

    if !reasons.is_empty() {
        return Err(reasons);
    }

    Ok(selections
        .iter()
        .map(|s| NewResponse::Nomination {
            target_id: s.target_id,
            rank: s.rank,
            score: nomination_score(s.rank, max_selections),
        })
        .collect())
}
