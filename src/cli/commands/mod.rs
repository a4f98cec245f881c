//! CLI command implementations.

pub mod analyze;
pub mod catalog;
pub mod form;
pub mod init;
pub mod progress;
pub mod submit;
pub mod survey;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::sqlite::{
    initialize_configured_database, SqliteCompletionRepository, SqliteResponseRepository, SqliteSubmissionStore,
    SqliteSurveyRepository,
};
use crate::domain::models::Config;
use crate::services::{CompletionTracker, SociogramService, SubmissionService};

pub type Tracker = CompletionTracker<SqliteSurveyRepository, SqliteResponseRepository, SqliteCompletionRepository>;
pub type Submissions =
    SubmissionService<SqliteSurveyRepository, SqliteResponseRepository, SqliteCompletionRepository, SqliteSubmissionStore>;
pub type Sociograms = SociogramService<SqliteSurveyRepository, SqliteResponseRepository, SqliteCompletionRepository>;

/// SQLite-backed repositories sharing one pool.
#[derive(Clone)]
pub struct Repositories {
    pub surveys: Arc<SqliteSurveyRepository>,
    pub responses: Arc<SqliteResponseRepository>,
    pub completions: Arc<SqliteCompletionRepository>,
    pub store: Arc<SqliteSubmissionStore>,
}

impl Repositories {
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = initialize_configured_database(&config.database)
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;

        Ok(Self {
            surveys: Arc::new(SqliteSurveyRepository::new(pool.clone())),
            responses: Arc::new(SqliteResponseRepository::new(pool.clone())),
            completions: Arc::new(SqliteCompletionRepository::new(pool.clone())),
            store: Arc::new(SqliteSubmissionStore::new(pool)),
        })
    }

    pub fn tracker(&self) -> Tracker {
        CompletionTracker::new(self.surveys.clone(), self.responses.clone(), self.completions.clone())
    }

    pub fn submissions(&self) -> Submissions {
        SubmissionService::new(
            self.surveys.clone(),
            self.responses.clone(),
            self.completions.clone(),
            self.store.clone(),
        )
    }

    pub fn sociograms(&self, config: &Config) -> Sociograms {
        SociogramService::new(
            self.surveys.clone(),
            self.responses.clone(),
            self.completions.clone(),
            &config.analysis,
        )
    }
}
