//! Question entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub section_id: String,

    /// Question kind: "text", "single_choice", "rating", "checkbox",
    /// "multiselect", "matrix", ...
    pub kind: String,

    pub title: String,

    /// Required questions gate final submission
    pub is_required: bool,

    /// Choice options for choice-like kinds (JSON array)
    #[sea_orm(column_type = "Json", nullable)]
    pub options: Option<JsonValue>,

    /// Display order within the section
    pub position: i32,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::section::Entity",
        from = "Column::SectionId",
        to = "super::section::Column::Id",
        on_delete = "Cascade"
    )]
    Section,

    #[sea_orm(has_many = "super::answer::Entity")]
    Answer,
}

impl Related<super::section::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Section.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether answers to this question are stored as ordered arrays
    /// rather than scalars.
    #[must_use]
    pub fn is_array_kind(&self) -> bool {
        matches!(self.kind.as_str(), "checkbox" | "multiselect" | "matrix")
    }
}
