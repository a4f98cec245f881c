//! Service layer: the submission flow and the sociogram analysis.

pub mod classifier;
pub mod completion_tracker;
pub mod graph_aggregator;
pub mod response_validator;
pub mod scoring;
pub mod sociogram_service;
pub mod submission_service;

pub use classifier::Classifier;
pub use completion_tracker::{recompute_state, CompletionTracker};
pub use graph_aggregator::{Aggregation, GraphAggregator, MemberTally};
pub use response_validator::ResponseValidator;
pub use scoring::{nomination_score, score_for};
pub use sociogram_service::SociogramService;
pub use submission_service::{FormQuestion, NominationForm, SubmissionReceipt, SubmissionService};
