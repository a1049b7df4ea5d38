//! Activity entity (a survey/poll/assessment instance).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Questionnaire attached to this activity (null until one is assigned)
    #[sea_orm(nullable)]
    pub questionnaire_id: Option<String>,

    pub title: String,

    /// Stored status: "draft", "published", "archived"
    pub status: String,

    /// When the activity opens for responses
    #[sea_orm(nullable)]
    pub start_date: Option<DateTime<Utc>>,

    /// When the activity stops being live
    #[sea_orm(nullable)]
    pub end_date: Option<DateTime<Utc>>,

    /// Hard cutoff after which no responses are accepted at all
    #[sea_orm(nullable)]
    pub close_date: Option<DateTime<Utc>>,

    /// Whether anonymous guests may respond without a participant record
    pub allow_guests: bool,

    pub created_at: DateTime<Utc>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::participant::Entity")]
    Participant,

    #[sea_orm(has_many = "super::response::Entity")]
    Response,

    #[sea_orm(
        belongs_to = "super::questionnaire::Entity",
        from = "Column::QuestionnaireId",
        to = "super::questionnaire::Column::Id"
    )]
    Questionnaire,
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participant.def()
    }
}

impl Related<super::response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Response.def()
    }
}

impl Related<super::questionnaire::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questionnaire.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Derive the effective status from the stored status and date window.
    ///
    /// Manual "draft"/"archived" take precedence over any dates. Past the
    /// close date the activity is "closed"; past the end date, "expired";
    /// inside the start/end window, "live"; before the start date,
    /// "upcoming".
    #[must_use]
    pub fn computed_status(&self, now: DateTime<Utc>) -> &str {
        if self.status == "draft" || self.status == "archived" {
            return &self.status;
        }

        if self.close_date.is_some_and(|close| now > close) {
            return "closed";
        }

        if self.end_date.is_some_and(|end| now > end) {
            return "expired";
        }

        if let Some(start) = self.start_date {
            if now >= start && self.end_date.is_none_or(|end| now <= end) {
                return "live";
            }
            if now < start {
                return "upcoming";
            }
        }

        &self.status
    }

    /// Whether the activity currently accepts responses.
    ///
    /// "expired" still accepts: the window for starting is over, but
    /// in-flight respondents may finish late.
    #[must_use]
    pub fn can_accept_responses(&self, now: DateTime<Utc>) -> bool {
        matches!(self.computed_status(now), "live" | "expired")
    }
}
