//! Denormalized answers mirror.
//!
//! After every save, the relational answer rows are flattened into a
//! `{question_id: value_or_array}` map and written onto the response row as
//! a redundant backup. The relational rows stay authoritative; the mirror
//! exists so response data survives even if they are lost, and so read
//! paths that expect a JSON blob keep working. Mirror failures are logged
//! and swallowed; they must never abort the save that triggered them.

use canvass_db::entities::answer;
use canvass_db::repositories::{AnswerRepository, ResponseRepository};
use canvass_common::AppResult;
use sea_orm::ConnectionTrait;
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Best-effort synchronizer for the response's JSON answers column.
#[derive(Clone)]
pub struct AnswerMirror {
    response_repo: ResponseRepository,
    answer_repo: AnswerRepository,
}

impl AnswerMirror {
    /// Create a new answer mirror.
    #[must_use]
    pub const fn new(response_repo: ResponseRepository, answer_repo: AnswerRepository) -> Self {
        Self {
            response_repo,
            answer_repo,
        }
    }

    /// Rebuild and write the mirror for a response. Never fails: errors are
    /// logged and dropped so the surrounding transaction is unaffected.
    pub async fn sync<C: ConnectionTrait>(&self, conn: &C, response_id: &str) {
        if let Err(e) = self.try_sync(conn, response_id).await {
            tracing::error!(
                response_id,
                error = %e,
                "Answer mirror sync failed; relational answers remain authoritative"
            );
        }
    }

    async fn try_sync<C: ConnectionTrait>(&self, conn: &C, response_id: &str) -> AppResult<()> {
        // Reload the rows fresh so the projection never acts on stale
        // in-memory state
        let answers = self.answer_repo.find_by_response(conn, response_id).await?;
        let map = project_answers(&answers);

        // An empty map means nothing worth mirroring yet
        if map.is_empty() {
            return Ok(());
        }

        let entries = map.len();
        self.response_repo
            .write_answers_json(conn, response_id, JsonValue::Object(map))
            .await?;

        tracing::debug!(response_id, entries, "Synced answers to mirror column");
        Ok(())
    }
}

/// Flatten answer rows into the mirror map: `value_array` wins when
/// non-empty, then a non-empty scalar `value`; rows with neither are left
/// out entirely (they stay answered relationally but have nothing to
/// mirror).
#[must_use]
pub fn project_answers(answers: &[answer::Model]) -> JsonMap<String, JsonValue> {
    let mut map = JsonMap::new();

    for answer in answers {
        if let Some(array) = answer.value_array.as_ref().and_then(JsonValue::as_array)
            && !array.is_empty()
        {
            map.insert(
                answer.question_id.clone(),
                JsonValue::Array(array.clone()),
            );
            continue;
        }

        if let Some(value) = answer.value.as_ref()
            && !value.is_empty()
        {
            map.insert(answer.question_id.clone(), JsonValue::String(value.clone()));
        }
    }

    map
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn answer_row(question_id: &str, value: Option<&str>, array: Option<JsonValue>) -> answer::Model {
        answer::Model {
            id: format!("ans-{question_id}"),
            response_id: "resp1".to_string(),
            question_id: question_id.to_string(),
            value: value.map(ToString::to_string),
            value_array: array,
            value_translations: None,
            time_spent: None,
            revision_count: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_projection_keys_by_question_id() {
        let answers = vec![
            answer_row("q1", Some("y"), None),
            answer_row("q2", Some("x"), None),
            answer_row("q3", None, Some(json!(["a", "b"]))),
        ];

        let map = project_answers(&answers);
        assert_eq!(map.len(), 3);
        assert_eq!(map["q1"], json!("y"));
        assert_eq!(map["q2"], json!("x"));
        assert_eq!(map["q3"], json!(["a", "b"]));
    }

    #[test]
    fn test_non_empty_array_wins_over_scalar() {
        let answers = vec![answer_row("q1", Some("scalar"), Some(json!(["kept"])))];

        let map = project_answers(&answers);
        assert_eq!(map["q1"], json!(["kept"]));
    }

    #[test]
    fn test_empty_array_falls_back_to_scalar() {
        let answers = vec![answer_row("q1", Some("scalar"), Some(json!([])))];

        let map = project_answers(&answers);
        assert_eq!(map["q1"], json!("scalar"));
    }

    #[test]
    fn test_valueless_rows_are_omitted() {
        let answers = vec![
            answer_row("q1", None, None),
            answer_row("q2", Some(""), None),
            answer_row("q3", Some(""), Some(json!([]))),
        ];

        let map = project_answers(&answers);
        assert!(map.is_empty());
    }
}
