//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - SurveyRepository: reference data handed over by the catalog
//! - ResponseRepository: read access to answers
//! - CompletionRepository: completion records
//! - SubmissionStore: transactional write path for one submission

pub mod completion_repository;
pub mod response_repository;
pub mod submission_store;
pub mod survey_repository;

pub use completion_repository::CompletionRepository;
pub use response_repository::ResponseRepository;
pub use submission_store::{SubmissionStore, SubmissionTransaction};
pub use survey_repository::SurveyRepository;
