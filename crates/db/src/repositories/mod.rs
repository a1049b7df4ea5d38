//! Database repositories.

mod activity;
mod answer;
mod participant;
mod questionnaire;
mod response;

pub use activity::ActivityRepository;
pub use answer::AnswerRepository;
pub use participant::ParticipantRepository;
pub use questionnaire::{QuestionnaireRepository, QuestionnaireSnapshot};
pub use response::{ResponseFilter, ResponseRepository};
