//! Participant entity (a person recruited into an activity).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub activity_id: String,

    #[sea_orm(nullable)]
    pub name: Option<String>,

    #[sea_orm(nullable)]
    pub email: Option<String>,

    /// "active" or "inactive"
    pub status: String,

    /// Guest pseudo-participant created for link-based access
    pub is_guest: bool,

    /// Preview participants are excluded from listings and statistics
    pub is_preview: bool,

    /// Registered participants can be explicitly flagged anonymous; their
    /// responses count into the anonymous bucket in statistics
    pub is_anonymous: bool,

    /// Soft delete marker
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTime<Utc>>,

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

    #[sea_orm(has_many = "super::response::Entity")]
    Response,
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activity.def()
    }
}

impl Related<super::response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Response.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
