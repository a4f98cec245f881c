//! Sociogram - peer-nomination surveys and sociometric analysis
//!
//! Members of a fixed cohort answer a survey by nominating peers in rank
//! order. Ranked nominations are scored, stored, and aggregated into a
//! directed weighted graph where each member is classified as accepted,
//! rejected or invisible.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): validation, submission, completion tracking and aggregation
//! - **Adapters** (`adapters`): SQLite implementations of the ports
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use sociogram::adapters::sqlite::*;
//! use sociogram::services::SociogramService;
//!
//! let sociogram = service.build(survey_id, cohort_id).await?;
//! for node in &sociogram.nodes {
//!     println!("{} {:?}", node.display_name, node.category);
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{AnswerError, AnswerErrorReason, DomainError, DomainResult, ErrorCategory};
pub use domain::models::{
    Answer, AnswerBatch, Category, Cohort, CohortSnapshot, CompletionKey, CompletionState, CompletionStatus,
    Config, Member, Polarity, Question, QuestionKind, Sociogram, Survey,
};
pub use domain::ports::{CompletionRepository, ResponseRepository, SubmissionStore, SurveyRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    Classifier, CompletionTracker, GraphAggregator, ResponseValidator, SociogramService, SubmissionService,
};
