pub mod cohort;
pub mod completion;
pub mod config;
pub mod response;
pub mod sociogram;
pub mod survey;

pub use cohort::{Cohort, CohortSnapshot, Member};
pub use completion::{
    progress_percentage, CohortProgress, CompletionKey, CompletionState, CompletionStatus,
    RespondentProgress,
};
pub use config::{AnalysisConfig, Config, DatabaseConfig, LoggingConfig, TieBreak};
pub use response::{
    Answer, AnswerBatch, NewResponse, QuestionWrite, Response, Selection, ValidatedSubmission,
};
pub use sociogram::{
    Category, CategoryCounts, EdgeStrength, SociometricEdge, SociometricNode, Sociogram,
};
pub use survey::{ChoiceOption, NominationRule, Polarity, Question, QuestionKind, Survey};
