//! Response records and the submission shapes that produce them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted answer row.
///
/// Nomination rows carry `target_id`, `rank` and the derived `score`;
/// single-choice rows carry `option_id`; free-text rows carry `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub respondent_id: Uuid,
    pub question_id: Uuid,
    pub target_id: Option<Uuid>,
    pub rank: Option<u32>,
    pub score: Option<u32>,
    pub option_id: Option<Uuid>,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated row waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewResponse {
    Nomination { target_id: Uuid, rank: u32, score: u32 },
    Choice { option_id: Uuid },
    Text { text: String },
}

impl NewResponse {
    pub fn into_response(self, survey_id: Uuid, respondent_id: Uuid, question_id: Uuid, now: DateTime<Utc>) -> Response {
        let mut response = Response {
            id: Uuid::new_v4(),
            survey_id,
            respondent_id,
            question_id,
            target_id: None,
            rank: None,
            score: None,
            option_id: None,
            text: None,
            created_at: now,
        };
        match self {
            Self::Nomination { target_id, rank, score } => {
                response.target_id = Some(target_id);
                response.rank = Some(rank);
                response.score = Some(score);
            }
            Self::Choice { option_id } => response.option_id = Some(option_id),
            Self::Text { text } => response.text = Some(text),
        }
        response
    }
}

/// One peer picked by the respondent, with its 1-based preference rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub target_id: Uuid,
    pub rank: u32,
}

/// The answer to one question as submitted.
///
/// Which field matters depends on the question kind; the validator reports
/// a missing field rather than rejecting the shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    #[serde(default)]
    pub selections: Vec<Selection>,
    #[serde(default)]
    pub option_id: Option<Uuid>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Answer {
    pub fn nominations(question_id: Uuid, targets: &[Uuid]) -> Self {
        let selections = targets
            .iter()
            .zip(1u32..)
            .map(|(&target_id, rank)| Selection { target_id, rank })
            .collect();
        Self { question_id, selections, ..Default::default() }
    }

    pub fn choice(question_id: Uuid, option_id: Uuid) -> Self {
        Self { question_id, option_id: Some(option_id), ..Default::default() }
    }

    pub fn text(question_id: Uuid, text: impl Into<String>) -> Self {
        Self { question_id, text: Some(text.into()), ..Default::default() }
    }
}

/// Everything one respondent submits for one survey in a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerBatch {
    pub survey_id: Uuid,
    pub cohort_id: Uuid,
    pub respondent_id: Uuid,
    pub answers: Vec<Answer>,
}

/// Rows replacing the respondent's previous answers to one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionWrite {
    pub question_id: Uuid,
    pub rows: Vec<NewResponse>,
}

/// A batch that passed every check and is ready for the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub survey_id: Uuid,
    pub cohort_id: Uuid,
    pub respondent_id: Uuid,
    pub writes: Vec<QuestionWrite>,
}

impl ValidatedSubmission {
    pub fn row_count(&self) -> usize {
        self.writes.iter().map(|w| w.rows.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominations_rank_in_order() {
        let targets = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let answer = Answer::nominations(Uuid::new_v4(), &targets);

        let ranks: Vec<u32> = answer.selections.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(answer.selections[2].target_id, targets[2]);
    }

    #[test]
    fn test_answer_json_defaults() {
        let json = r#"{"question_id": "6f1c1a8e-2d8a-4a4f-9d3e-0c6e4a0b9f11", "text": "ok"}"#;
        let answer: Answer = serde_json::from_str(json).unwrap();
        assert!(answer.selections.is_empty());
        assert_eq!(answer.text.as_deref(), Some("ok"));
    }
}
