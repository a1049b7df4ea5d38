//! Response entity (one attempt to complete an activity's questionnaire).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Status value for an in-flight response.
pub const STATUS_IN_PROGRESS: &str = "in_progress";
/// Status value for a finalized response.
pub const STATUS_SUBMITTED: &str = "submitted";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "response")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub activity_id: String,

    /// Null for guest responses
    #[sea_orm(nullable)]
    pub participant_id: Option<String>,

    /// Client-supplied identifier for guest responses
    #[sea_orm(nullable)]
    pub guest_identifier: Option<String>,

    /// "in_progress" or "submitted"
    pub status: String,

    pub language: String,

    /// Question count snapshotted when the response was started
    pub total_questions: i32,

    /// Count of distinct answered questions, recomputed on every save
    pub answered_questions: i32,

    /// answered/total * 100, two decimals, 0 when total is 0
    #[sea_orm(column_type = "Double")]
    pub completion_percentage: f64,

    /// Preview responses are excluded from listings and statistics
    pub is_preview: bool,

    pub started_at: DateTime<Utc>,

    /// Refreshed on every save (autosave or manual)
    #[sea_orm(nullable)]
    pub last_saved_at: Option<DateTime<Utc>>,

    #[sea_orm(nullable)]
    pub submitted_at: Option<DateTime<Utc>>,

    /// Opaque client metadata captured at start
    #[sea_orm(column_type = "Json", nullable)]
    pub metadata: Option<JsonValue>,

    /// Denormalized backup map `{question_id: value_or_array}`, written
    /// behind the relational answer rows after every save
    #[sea_orm(column_type = "Json", nullable)]
    pub answers: Option<JsonValue>,

    pub created_at: DateTime<Utc>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::activity::Entity",
        from = "Column::ActivityId",
        to = "super::activity::Column::Id",
        on_delete = "Cascade"
    )]
    Activity,

    #[sea_orm(
        belongs_to = "super::participant::Entity",
        from = "Column::ParticipantId",
        to = "super::participant::Column::Id"
    )]
    Participant,

    #[sea_orm(has_many = "super::answer::Entity")]
    Answer,
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activity.def()
    }
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participant.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this response has been finalized.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.status == STATUS_SUBMITTED
    }

    /// Whether this response is still being filled in.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.status == STATUS_IN_PROGRESS
    }
}
