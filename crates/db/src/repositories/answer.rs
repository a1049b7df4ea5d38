//! Answer repository.

use std::sync::Arc;

use crate::entities::{answer, Answer};
use canvass_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect,
};

/// Answer repository for database operations.
///
/// Every method that participates in a SaveProgress/Submit flow takes an
/// explicit connection so it can run inside the surrounding transaction.
#[derive(Clone)]
pub struct AnswerRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerRepository {
    /// Create a new answer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the answer for one question within one response. The
    /// `(response_id, question_id)` pair is the upsert key.
    pub async fn find_by_response_and_question<C: ConnectionTrait>(
        &self,
        conn: &C,
        response_id: &str,
        question_id: &str,
    ) -> AppResult<Option<answer::Model>> {
        Answer::find()
            .filter(answer::Column::ResponseId.eq(response_id))
            .filter(answer::Column::QuestionId.eq(question_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new answer.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: answer::ActiveModel,
    ) -> AppResult<answer::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an existing answer.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: answer::ActiveModel,
    ) -> AppResult<answer::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Load all answers belonging to a response.
    pub async fn find_by_response<C: ConnectionTrait>(
        &self,
        conn: &C,
        response_id: &str,
    ) -> AppResult<Vec<answer::Model>> {
        Answer::find()
            .filter(answer::Column::ResponseId.eq(response_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Load a response's answers outside any transaction.
    pub async fn find_by_response_id(&self, response_id: &str) -> AppResult<Vec<answer::Model>> {
        self.find_by_response(self.db.as_ref(), response_id).await
    }

    /// Count distinct answered questions for a response.
    pub async fn count_by_response<C: ConnectionTrait>(
        &self,
        conn: &C,
        response_id: &str,
    ) -> AppResult<u64> {
        Answer::find()
            .filter(answer::Column::ResponseId.eq(response_id))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of all questions that have an answer row for this response.
    /// Row existence is what the submit validator checks, not value
    /// non-emptiness.
    pub async fn answered_question_ids<C: ConnectionTrait>(
        &self,
        conn: &C,
        response_id: &str,
    ) -> AppResult<Vec<String>> {
        Answer::find()
            .select_only()
            .column(answer::Column::QuestionId)
            .filter(answer::Column::ResponseId.eq(response_id))
            .into_tuple()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Load the answers of many responses at once (statistics input).
    pub async fn find_for_responses(
        &self,
        response_ids: &[String],
    ) -> AppResult<Vec<answer::Model>> {
        if response_ids.is_empty() {
            return Ok(Vec::new());
        }

        Answer::find()
            .filter(answer::Column::ResponseId.is_in(response_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn sample_answer() -> answer::Model {
        answer::Model {
            id: "ans1".to_string(),
            response_id: "resp1".to_string(),
            question_id: "q1".to_string(),
            value: Some("hello".to_string()),
            value_array: None,
            value_translations: None,
            time_spent: Some(12),
            revision_count: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_response_and_question() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![sample_answer()]])
                .into_connection(),
        );
        let repo = AnswerRepository::new(Arc::clone(&db));

        let found = repo
            .find_by_response_and_question(db.as_ref(), "resp1", "q1")
            .await
            .unwrap();
        assert_eq!(found.unwrap().question_id, "q1");
    }

    #[tokio::test]
    async fn test_find_for_responses_empty_input_short_circuits() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = AnswerRepository::new(Arc::new(db));

        let answers = repo.find_for_responses(&[]).await.unwrap();
        assert!(answers.is_empty());
    }
}
