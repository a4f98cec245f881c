//! Domain layer for the sociogram core
//!
//! This module contains the survey, response and sociogram models, the error
//! taxonomy, and the port traits persistence adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{AnswerError, AnswerErrorReason, DomainError, DomainResult, ErrorCategory};
