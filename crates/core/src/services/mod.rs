//! Business logic services.

pub mod mirror;
pub mod response;
pub mod statistics;

pub use mirror::AnswerMirror;
pub use response::{
    AnswerInput, ProgressReport, ResponseAggregate, ResponseService, ResumeOutcome,
    SaveProgressInput, StartInput, StartOutcome, SubmitInput,
};
pub use statistics::{
    ActivityStatistics, AnswerView, ListQuery, ResponseListItem, ResponseListing,
    StatisticsService,
};
