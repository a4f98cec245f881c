//! Shared fixtures for integration tests.
//!
//! Every harness owns its own migrated database, in memory unless a
//! directory is given.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use sociogram::adapters::sqlite::{
    create_migrated_test_pool, initialize_database, PoolConfig, SqliteCompletionRepository, SqliteResponseRepository,
    SqliteSubmissionStore, SqliteSurveyRepository,
};
use sociogram::domain::models::{AnalysisConfig, Answer, AnswerBatch, Cohort, Member, Question, Survey};
use sociogram::domain::ports::SurveyRepository;
use sociogram::services::{CompletionTracker, SociogramService, SubmissionService};

pub type Submissions =
    SubmissionService<SqliteSurveyRepository, SqliteResponseRepository, SqliteCompletionRepository, SqliteSubmissionStore>;
pub type Tracker = CompletionTracker<SqliteSurveyRepository, SqliteResponseRepository, SqliteCompletionRepository>;
pub type Sociograms = SociogramService<SqliteSurveyRepository, SqliteResponseRepository, SqliteCompletionRepository>;

pub struct Harness {
    pub pool: SqlitePool,
    pub surveys: Arc<SqliteSurveyRepository>,
    pub responses: Arc<SqliteResponseRepository>,
    pub completions: Arc<SqliteCompletionRepository>,
    pub store: Arc<SqliteSubmissionStore>,
}

impl Harness {
    pub async fn new() -> Self {
        let pool = create_migrated_test_pool().await.expect("Failed to create test pool");
        Self::with_pool(pool)
    }

    /// File-backed database with a multi-connection pool, for tests that need real concurrency.
    pub async fn on_disk(dir: &Path) -> Self {
        let url = format!("sqlite:{}", dir.join("sociogram.db").display());
        let config = PoolConfig { max_connections: 8, ..PoolConfig::default() };
        let pool = initialize_database(&url, Some(config)).await.expect("Failed to open file database");
        Self::with_pool(pool)
    }

    pub fn with_pool(pool: SqlitePool) -> Self {
        Self {
            surveys: Arc::new(SqliteSurveyRepository::new(pool.clone())),
            responses: Arc::new(SqliteResponseRepository::new(pool.clone())),
            completions: Arc::new(SqliteCompletionRepository::new(pool.clone())),
            store: Arc::new(SqliteSubmissionStore::new(pool.clone())),
            pool,
        }
    }

    pub fn submissions(&self) -> Submissions {
        SubmissionService::new(
            self.surveys.clone(),
            self.responses.clone(),
            self.completions.clone(),
            self.store.clone(),
        )
    }

    pub fn tracker(&self) -> Tracker {
        CompletionTracker::new(self.surveys.clone(), self.responses.clone(), self.completions.clone())
    }

    pub fn sociograms(&self) -> Sociograms {
        SociogramService::new(
            self.surveys.clone(),
            self.responses.clone(),
            self.completions.clone(),
            &AnalysisConfig::default(),
        )
    }

    /// Store the survey, its members and one cohort holding all of them.
    pub async fn seed(&self, survey: &Survey, members: &[Member]) -> Cohort {
        self.surveys.save_survey(survey).await.expect("save survey");
        for member in members {
            self.surveys.save_member(member).await.expect("save member");
        }
        let cohort = Cohort::new("1A").with_members(members.iter().map(|m| m.id));
        self.surveys.save_cohort(&cohort).await.expect("save cohort");
        self.surveys.assign_cohort(survey.id, cohort.id).await.expect("assign cohort");
        cohort
    }
}

/// A survey open from yesterday until tomorrow.
pub fn open_survey(questions: Vec<Question>) -> Survey {
    let now = Utc::now();
    questions
        .into_iter()
        .fold(Survey::new("Team climate", now - Duration::days(1), now + Duration::days(1)), |s, q| {
            s.with_question(q)
        })
}

/// Members named A, B, C, ...
pub fn members(count: usize) -> Vec<Member> {
    (0..count)
        .map(|i| {
            let letter = char::from(b'A' + u8::try_from(i % 26).unwrap_or(0));
            Member::new(format!("{letter}{i:03}"), letter.to_string())
        })
        .collect()
}

pub fn batch(survey: &Survey, cohort: &Cohort, respondent: Uuid, answers: Vec<Answer>) -> AnswerBatch {
    AnswerBatch {
        survey_id: survey.id,
        cohort_id: cohort.id,
        respondent_id: respondent,
        answers,
    }
}
