//! Response repository.

use std::sync::Arc;

use crate::entities::{response, Response};
use canvass_common::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde_json::Value as JsonValue;

/// Filters for listing an activity's responses.
#[derive(Debug, Clone, Default)]
pub struct ResponseFilter {
    /// Restrict to a status ("submitted" or "in_progress").
    pub status: Option<String>,
    /// Restrict to one participant.
    pub participant_id: Option<String>,
}

/// Response repository for database operations.
#[derive(Clone)]
pub struct ResponseRepository {
    db: Arc<DatabaseConnection>,
}

impl ResponseRepository {
    /// Create a new response repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a response by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<response::Model>> {
        Response::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a response by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<response::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResponseNotFound(id.to_string()))
    }

    /// Find an existing non-preview response for a registered participant.
    pub async fn find_by_participant(
        &self,
        activity_id: &str,
        participant_id: &str,
    ) -> AppResult<Option<response::Model>> {
        Response::find()
            .filter(response::Column::ActivityId.eq(activity_id))
            .filter(response::Column::ParticipantId.eq(participant_id))
            .filter(response::Column::IsPreview.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an existing non-preview response for a guest identifier.
    pub async fn find_by_guest(
        &self,
        activity_id: &str,
        guest_identifier: &str,
    ) -> AppResult<Option<response::Model>> {
        Response::find()
            .filter(response::Column::ActivityId.eq(activity_id))
            .filter(response::Column::GuestIdentifier.eq(guest_identifier))
            .filter(response::Column::IsPreview.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new response.
    pub async fn create(&self, model: response::ActiveModel) -> AppResult<response::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a response on the given connection (usable inside a
    /// transaction).
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: response::ActiveModel,
    ) -> AppResult<response::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Stamp `last_saved_at` for an autosave. Kept as its own narrow update
    /// so autosaves are distinguishable from the main progress update in
    /// query logs and audits.
    pub async fn touch_autosave<C: ConnectionTrait>(
        &self,
        conn: &C,
        response_id: &str,
        saved_at: DateTime<Utc>,
    ) -> AppResult<()> {
        Response::update_many()
            .col_expr(response::Column::LastSavedAt, Expr::value(saved_at))
            .filter(response::Column::Id.eq(response_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write the denormalized answers map straight onto the row.
    ///
    /// Deliberately a bare column update rather than an `ActiveModel` save:
    /// the mirror write must not trigger model behavior or touch
    /// `updated_at`.
    pub async fn write_answers_json<C: ConnectionTrait>(
        &self,
        conn: &C,
        response_id: &str,
        answers: JsonValue,
    ) -> AppResult<()> {
        Response::update_many()
            .col_expr(response::Column::Answers, Expr::value(answers))
            .filter(response::Column::Id.eq(response_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Load all non-preview responses in scope for statistics: responses
    /// from the given participants, plus guest responses with no
    /// participant at all.
    pub async fn find_scoped(
        &self,
        activity_id: &str,
        valid_participant_ids: &[String],
    ) -> AppResult<Vec<response::Model>> {
        Response::find()
            .filter(response::Column::ActivityId.eq(activity_id))
            .filter(response::Column::IsPreview.eq(false))
            .filter(
                Condition::any()
                    .add(response::Column::ParticipantId.is_in(valid_participant_ids.to_vec()))
                    .add(response::Column::ParticipantId.is_null()),
            )
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List an activity's responses (paginated, newest first), restricted
    /// to valid participants or guest responses.
    pub async fn list_for_activity(
        &self,
        activity_id: &str,
        valid_participant_ids: &[String],
        filter: &ResponseFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<response::Model>> {
        self.listing_query(activity_id, valid_participant_ids, filter)
            .order_by_desc(response::Column::StartedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the responses matching a listing.
    pub async fn count_for_activity(
        &self,
        activity_id: &str,
        valid_participant_ids: &[String],
        filter: &ResponseFilter,
    ) -> AppResult<u64> {
        self.listing_query(activity_id, valid_participant_ids, filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn listing_query(
        &self,
        activity_id: &str,
        valid_participant_ids: &[String],
        filter: &ResponseFilter,
    ) -> sea_orm::Select<Response> {
        let mut query = Response::find()
            .filter(response::Column::ActivityId.eq(activity_id))
            .filter(response::Column::IsPreview.eq(false))
            .filter(
                Condition::any()
                    .add(response::Column::ParticipantId.is_in(valid_participant_ids.to_vec()))
                    .add(response::Column::ParticipantId.is_null()),
            );

        if let Some(status) = filter.status.as_deref() {
            query = query.filter(response::Column::Status.eq(status));
        }

        if let Some(participant_id) = filter.participant_id.as_deref() {
            query = query.filter(response::Column::ParticipantId.eq(participant_id));
        }

        query
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn sample_response() -> response::Model {
        response::Model {
            id: "resp1".to_string(),
            activity_id: "act1".to_string(),
            participant_id: Some("part1".to_string()),
            guest_identifier: None,
            status: "in_progress".to_string(),
            language: "en".to_string(),
            total_questions: 3,
            answered_questions: 1,
            completion_percentage: 33.33,
            is_preview: false,
            started_at: Utc::now(),
            last_saved_at: None,
            submitted_at: None,
            metadata: None,
            answers: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_participant_returns_model() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_response()]])
            .into_connection();
        let repo = ResponseRepository::new(Arc::new(db));

        let found = repo.find_by_participant("act1", "part1").await.unwrap();
        assert_eq!(found.unwrap().id, "resp1");
    }

    #[tokio::test]
    async fn test_get_by_id_maps_missing_to_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<response::Model>::new()])
            .into_connection();
        let repo = ResponseRepository::new(Arc::new(db));

        let err = repo.get_by_id("nope").await.unwrap_err();
        assert_eq!(err.error_code(), "RESPONSE_NOT_FOUND");
    }
}
