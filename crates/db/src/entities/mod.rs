//! Database entities.

pub mod activity;
pub mod answer;
pub mod participant;
pub mod question;
pub mod questionnaire;
pub mod response;
pub mod section;

pub use activity::Entity as Activity;
pub use answer::Entity as Answer;
pub use participant::Entity as Participant;
pub use question::Entity as Question;
pub use questionnaire::Entity as Questionnaire;
pub use response::Entity as Response;
pub use section::Entity as Section;
