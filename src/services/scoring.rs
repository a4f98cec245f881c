//! Rank-to-points rule for nomination questions.

use crate::domain::models::{Question, QuestionKind};

/// Points awarded to the peer ranked `rank` on a question allowing `max_selections` picks.
///
/// Rank 1 earns `max_selections` points and the last allowed rank earns 1.
/// Ranks beyond the limit are floored at 1.
pub fn nomination_score(rank: u32, max_selections: u32) -> u32 {
    max_selections.saturating_sub(rank).saturating_add(1).max(1)
}

/// Score of a rank on a given question; `None` for anything but a nomination.
pub fn score_for(question: &Question, rank: u32) -> Option<u32> {
    match question.kind {
        QuestionKind::Nomination { max_selections, .. } => Some(nomination_score(rank, max_selections)),
        _ => None,
    }
}
