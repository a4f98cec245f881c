//! Completion lifecycle of a respondent within a survey.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state derived from progress.
///
/// - Pending: nothing answered yet
/// - InProgress: some but not all questions answered
/// - Completed: every question answered; further submissions are refused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Identity of a completion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionKey {
    pub survey_id: Uuid,
    pub respondent_id: Uuid,
    pub cohort_id: Uuid,
}

impl CompletionKey {
    pub fn new(survey_id: Uuid, respondent_id: Uuid, cohort_id: Uuid) -> Self {
        Self { survey_id, respondent_id, cohort_id }
    }
}

/// Progress record of one respondent for one survey and cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionState {
    pub survey_id: Uuid,
    pub respondent_id: Uuid,
    pub cohort_id: Uuid,
    pub status: CompletionStatus,
    /// Percentage in [0, 100], two decimals.
    pub progress: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl CompletionState {
    pub fn pending(key: CompletionKey, now: DateTime<Utc>) -> Self {
        Self {
            survey_id: key.survey_id,
            respondent_id: key.respondent_id,
            cohort_id: key.cohort_id,
            status: CompletionStatus::Pending,
            progress: 0.0,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    pub fn key(&self) -> CompletionKey {
        CompletionKey::new(self.survey_id, self.respondent_id, self.cohort_id)
    }

    /// Recompute progress and status from answered/total question counts.
    ///
    /// Timestamps are only ever set, never cleared. Returns whether the
    /// record changed; `updated_at` moves only when it did.
    pub fn apply_progress(&mut self, answered: usize, total: usize, now: DateTime<Utc>) -> bool {
        let answered = answered.min(total);
        let progress = progress_percentage(answered, total);
        let status = if answered == 0 {
            CompletionStatus::Pending
        } else if answered == total {
            CompletionStatus::Completed
        } else {
            CompletionStatus::InProgress
        };

        let mut changed = false;
        if (self.progress - progress).abs() > f64::EPSILON {
            self.progress = progress;
            changed = true;
        }
        if self.status != status {
            self.status = status;
            changed = true;
        }
        if status != CompletionStatus::Pending && self.started_at.is_none() {
            self.started_at = Some(now);
            changed = true;
        }
        if status == CompletionStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(now);
            changed = true;
        }
        if changed {
            self.updated_at = now;
        }
        changed
    }
}

/// `answered / total * 100`, rounded to two decimals; 0 when there are no questions.
pub fn progress_percentage(answered: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(answered as f64 / total as f64 * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Progress of a single respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespondentProgress {
    pub answered_questions: usize,
    pub total_questions: usize,
    pub state: CompletionState,
}

/// Completion tallies of one cohort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortProgress {
    pub survey_id: Uuid,
    pub cohort_id: Uuid,
    pub tracked: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub completed_percentage: f64,
}

impl CohortProgress {
    pub fn tally<'a>(survey_id: Uuid, cohort_id: Uuid, states: impl IntoIterator<Item = &'a CompletionState>) -> Self {
        let mut progress = Self { survey_id, cohort_id, ..Self::default() };
        for state in states {
            progress.tracked += 1;
            match state.status {
                CompletionStatus::Completed => progress.completed += 1,
                CompletionStatus::InProgress => progress.in_progress += 1,
                CompletionStatus::Pending => progress.pending += 1,
            }
        }
        progress.completed_percentage = progress_percentage(progress.completed, progress.tracked);
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn state() -> CompletionState {
        CompletionState::pending(CompletionKey::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()), Utc::now())
    }

    #[test]
    fn test_transitions_follow_progress() {
        let mut s = state();
        let t1 = Utc::now();

        assert!(s.apply_progress(1, 3, t1));
        assert_eq!(s.status, CompletionStatus::InProgress);
        assert!((s.progress - 33.33).abs() < f64::EPSILON);
        assert_eq!(s.started_at, Some(t1));
        assert!(s.completed_at.is_none());

        let t2 = t1 + Duration::minutes(5);
        assert!(s.apply_progress(3, 3, t2));
        assert_eq!(s.status, CompletionStatus::Completed);
        assert!((s.progress - 100.0).abs() < f64::EPSILON);
        assert_eq!(s.started_at, Some(t1));
        assert_eq!(s.completed_at, Some(t2));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut s = state();
        let now = Utc::now();
        s.apply_progress(2, 4, now);
        let snapshot = s.clone();

        assert!(!s.apply_progress(2, 4, now + Duration::hours(1)));
        assert_eq!(s, snapshot);
    }

    #[test]
    fn test_completed_at_is_never_cleared() {
        let mut s = state();
        let done = Utc::now();
        s.apply_progress(2, 2, done);

        // A question added later drops progress below 100.
        s.apply_progress(2, 3, done + Duration::days(1));
        assert_eq!(s.status, CompletionStatus::InProgress);
        assert_eq!(s.completed_at, Some(done));

        s.apply_progress(3, 3, done + Duration::days(2));
        assert_eq!(s.completed_at, Some(done));
    }

    #[test]
    fn test_empty_survey_stays_pending() {
        let mut s = state();
        assert!(!s.apply_progress(0, 0, Utc::now()));
        assert_eq!(s.status, CompletionStatus::Pending);
        assert!(s.started_at.is_none());
    }

    #[test]
    fn test_cohort_tally() {
        let mut done = state();
        done.apply_progress(1, 1, Utc::now());
        let mut half = state();
        half.apply_progress(1, 2, Utc::now());
        let idle = state();

        let tally = CohortProgress::tally(Uuid::nil(), Uuid::nil(), [&done, &half, &idle]);
        assert_eq!((tally.tracked, tally.completed, tally.in_progress, tally.pending), (3, 1, 1, 1));
        assert!((tally.completed_percentage - 33.33).abs() < f64::EPSILON);
    }
}
