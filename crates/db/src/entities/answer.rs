//! Answer entity (one participant's value for one question).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "answer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub response_id: String,

    pub question_id: String,

    /// Scalar value (text, choice, rating); null for array-kind questions
    #[sea_orm(column_type = "Text", nullable)]
    pub value: Option<String>,

    /// Ordered values for multi-select/matrix kinds (JSON array)
    #[sea_orm(column_type = "Json", nullable)]
    pub value_array: Option<JsonValue>,

    /// Per-language value map; replaced wholesale on update
    #[sea_orm(column_type = "Json", nullable)]
    pub value_translations: Option<JsonValue>,

    /// Seconds the respondent spent on the question; overwritten, not summed
    #[sea_orm(nullable)]
    pub time_spent: Option<i32>,

    /// Incremented on every update after the first write
    pub revision_count: i32,

    pub created_at: DateTime<Utc>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::response::Entity",
        from = "Column::ResponseId",
        to = "super::response::Column::Id",
        on_delete = "Cascade"
    )]
    Response,

    #[sea_orm(
        belongs_to = "super::question::Entity",
        from = "Column::QuestionId",
        to = "super::question::Column::Id",
        on_delete = "Cascade"
    )]
    Question,
}

impl Related<super::response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Response.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
