//! Participant repository.

use std::sync::Arc;

use crate::entities::{participant, Participant};
use canvass_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

/// Participant repository for database operations.
#[derive(Clone)]
pub struct ParticipantRepository {
    db: Arc<DatabaseConnection>,
}

impl ParticipantRepository {
    /// Create a new participant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a participant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<participant::Model>> {
        Participant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of the activity's currently valid participants: active, not
    /// soft-deleted, not preview. Listings and statistics are scoped to
    /// these.
    pub async fn valid_ids(&self, activity_id: &str) -> AppResult<Vec<String>> {
        Participant::find()
            .select_only()
            .column(participant::Column::Id)
            .filter(participant::Column::ActivityId.eq(activity_id))
            .filter(participant::Column::Status.eq("active"))
            .filter(participant::Column::DeletedAt.is_null())
            .filter(participant::Column::IsPreview.eq(false))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of valid participants explicitly flagged anonymous. Their
    /// responses count into the anonymous bucket in statistics, on top of
    /// guest responses with no participant at all.
    pub async fn anonymous_ids(&self, activity_id: &str) -> AppResult<Vec<String>> {
        Participant::find()
            .select_only()
            .column(participant::Column::Id)
            .filter(participant::Column::ActivityId.eq(activity_id))
            .filter(participant::Column::Status.eq("active"))
            .filter(participant::Column::DeletedAt.is_null())
            .filter(participant::Column::IsPreview.eq(false))
            .filter(participant::Column::IsAnonymous.eq(true))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
