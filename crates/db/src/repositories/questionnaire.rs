//! Questionnaire repository.

use std::sync::Arc;

use crate::entities::{question, section, Question, Section};
use canvass_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Read-only snapshot of a questionnaire's question tree, fetched once per
/// Start/Submit call. Carries everything the lifecycle needs without
/// re-traversing sections.
#[derive(Debug, Clone)]
pub struct QuestionnaireSnapshot {
    /// The questionnaire this snapshot was taken from.
    pub questionnaire_id: String,
    /// Sum of question counts across all sections.
    pub total_questions: i32,
    /// IDs of all `is_required` questions, across all sections.
    pub required_question_ids: Vec<String>,
}

/// Questionnaire repository for database operations.
#[derive(Clone)]
pub struct QuestionnaireRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionnaireRepository {
    /// Create a new questionnaire repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Load a snapshot of the questionnaire's sections and questions.
    pub async fn load_snapshot(&self, questionnaire_id: &str) -> AppResult<QuestionnaireSnapshot> {
        let section_ids: Vec<String> = Section::find()
            .filter(section::Column::QuestionnaireId.eq(questionnaire_id))
            .order_by_asc(section::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|s| s.id)
            .collect();

        if section_ids.is_empty() {
            return Ok(QuestionnaireSnapshot {
                questionnaire_id: questionnaire_id.to_string(),
                total_questions: 0,
                required_question_ids: Vec::new(),
            });
        }

        let questions = Question::find()
            .filter(question::Column::SectionId.is_in(section_ids))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let total_questions = questions.len() as i32;
        let required_question_ids = questions
            .into_iter()
            .filter(|q| q.is_required)
            .map(|q| q.id)
            .collect();

        Ok(QuestionnaireSnapshot {
            questionnaire_id: questionnaire_id.to_string(),
            total_questions,
            required_question_ids,
        })
    }

    /// Find a question by ID on the given connection (usable inside a
    /// transaction).
    pub async fn find_question<C: ConnectionTrait>(
        &self,
        conn: &C,
        question_id: &str,
    ) -> AppResult<Option<question::Model>> {
        Question::find_by_id(question_id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a question by ID, returning an error if not found.
    pub async fn get_question<C: ConnectionTrait>(
        &self,
        conn: &C,
        question_id: &str,
    ) -> AppResult<question::Model> {
        self.find_question(conn, question_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question not found: {question_id}")))
    }
}
