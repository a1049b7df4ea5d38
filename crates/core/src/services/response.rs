//! Response lifecycle service.
//!
//! Owns the state machine for a single response attempt: start, resume,
//! autosave/manual save, and final submission. Every mutating call applies
//! the answer batch, recomputes progress, and refreshes the denormalized
//! answers mirror inside one transaction; submission additionally validates
//! required questions before finalizing.

use std::collections::HashSet;
use std::sync::Arc;

use canvass_common::{AppError, AppResult, IdGenerator};
use canvass_db::entities::{answer, question, response};
use canvass_db::repositories::{
    ActivityRepository, AnswerRepository, QuestionnaireRepository, ResponseRepository,
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde_json::Value as JsonValue;

use crate::services::mirror::AnswerMirror;

/// Response service for business logic.
#[derive(Clone)]
pub struct ResponseService {
    db: Arc<DatabaseConnection>,
    activity_repo: ActivityRepository,
    questionnaire_repo: QuestionnaireRepository,
    response_repo: ResponseRepository,
    answer_repo: AnswerRepository,
    mirror: AnswerMirror,
    id_gen: IdGenerator,
}

/// Input for starting (or resuming) a response.
#[derive(Debug, Clone, Default)]
pub struct StartInput {
    pub participant_id: Option<String>,
    pub guest_identifier: Option<String>,
    pub language: Option<String>,
    pub metadata: Option<JsonValue>,
}

/// One entry of an answer batch.
#[derive(Debug, Clone)]
pub struct AnswerInput {
    pub question_id: String,
    /// Scalar value; stored even when falsy (false, 0, empty string)
    pub value: Option<JsonValue>,
    /// Takes precedence over `value` when present
    pub value_array: Option<Vec<JsonValue>>,
    /// Replaces the stored translations map wholesale
    pub value_translations: Option<JsonValue>,
    /// Overwrites the stored seconds; not accumulated
    pub time_spent: Option<i32>,
}

/// Input for a progress save.
#[derive(Debug, Clone, Default)]
pub struct SaveProgressInput {
    pub answers: Vec<AnswerInput>,
    pub auto_save: bool,
}

/// Input for final submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitInput {
    pub answers: Vec<AnswerInput>,
}

/// A response together with its relational answers. The answer rows are the
/// authoritative source; the JSON column on the response is only a mirror.
#[derive(Debug, Clone)]
pub struct ResponseAggregate {
    pub response: response::Model,
    pub answers: Vec<answer::Model>,
}

/// Outcome of a start call.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A fresh response was created.
    Started(ResponseAggregate),
    /// An in-progress response already existed for this identity.
    Resumed(ResponseAggregate),
    /// This identity already submitted; the existing response is returned
    /// so the caller can display it.
    AlreadySubmitted(ResponseAggregate),
}

/// Outcome of a resume call.
#[derive(Debug, Clone)]
pub enum ResumeOutcome {
    Resumed(ResponseAggregate),
    AlreadySubmitted(ResponseAggregate),
}

/// Progress snapshot for a response.
#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub total_questions: i32,
    pub answered_questions: i32,
    pub completion_percentage: f64,
    pub status: String,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl ResponseService {
    /// Create a new response service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        activity_repo: ActivityRepository,
        questionnaire_repo: QuestionnaireRepository,
        response_repo: ResponseRepository,
        answer_repo: AnswerRepository,
        mirror: AnswerMirror,
    ) -> Self {
        Self {
            db,
            activity_repo,
            questionnaire_repo,
            response_repo,
            answer_repo,
            mirror,
            id_gen: IdGenerator::new(),
        }
    }

    /// Start a new response, or hand back the identity's existing one.
    ///
    /// Idempotent for resuming callers: a second start with the same
    /// identity returns the same response with a resume marker instead of
    /// creating a duplicate.
    pub async fn start(&self, activity_id: &str, input: StartInput) -> AppResult<StartOutcome> {
        let activity = self.activity_repo.get_by_id(activity_id).await?;
        let now = Utc::now();

        if !activity.can_accept_responses(now) {
            return Err(AppError::ActivityNotAcceptingResponses(
                activity.computed_status(now).to_string(),
            ));
        }

        if input.participant_id.is_none() && !activity.allow_guests {
            return Err(AppError::GuestsNotAllowed);
        }

        if let Some(existing) = self
            .find_existing(
                activity_id,
                input.participant_id.as_deref(),
                input.guest_identifier.as_deref(),
            )
            .await?
        {
            let aggregate = self.load_aggregate(existing).await?;
            if aggregate.response.is_submitted() {
                return Ok(StartOutcome::AlreadySubmitted(aggregate));
            }
            return Ok(StartOutcome::Resumed(aggregate));
        }

        // Snapshot the question count at creation; the questionnaire tree is
        // read-only from this core's perspective
        let total_questions = match activity.questionnaire_id.as_deref() {
            Some(questionnaire_id) => {
                self.questionnaire_repo
                    .load_snapshot(questionnaire_id)
                    .await?
                    .total_questions
            }
            None => 0,
        };

        let model = response::ActiveModel {
            id: Set(self.id_gen.generate()),
            activity_id: Set(activity.id.clone()),
            participant_id: Set(input.participant_id),
            guest_identifier: Set(input.guest_identifier),
            status: Set(response::STATUS_IN_PROGRESS.to_string()),
            language: Set(input.language.unwrap_or_else(|| "en".to_string())),
            total_questions: Set(total_questions),
            answered_questions: Set(0),
            completion_percentage: Set(0.0),
            is_preview: Set(false),
            started_at: Set(now),
            last_saved_at: Set(None),
            submitted_at: Set(None),
            metadata: Set(input.metadata),
            answers: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let created = self.response_repo.create(model).await?;
        tracing::info!(response_id = %created.id, activity_id, "Started response");

        Ok(StartOutcome::Started(ResponseAggregate {
            response: created,
            answers: Vec::new(),
        }))
    }

    /// Resume an existing response for this identity; never creates one.
    pub async fn resume(&self, activity_id: &str, input: StartInput) -> AppResult<ResumeOutcome> {
        let existing = self
            .find_existing(
                activity_id,
                input.participant_id.as_deref(),
                input.guest_identifier.as_deref(),
            )
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No response found to resume for activity {activity_id}"))
            })?;

        let aggregate = self.load_aggregate(existing).await?;
        if aggregate.response.is_submitted() {
            return Ok(ResumeOutcome::AlreadySubmitted(aggregate));
        }
        Ok(ResumeOutcome::Resumed(aggregate))
    }

    /// Save an answer batch (autosave or manual).
    ///
    /// Runs upsert, progress recompute, and the mirror sync inside one
    /// transaction; any failure rolls the whole batch back.
    pub async fn save_progress(
        &self,
        response_id: &str,
        input: SaveProgressInput,
    ) -> AppResult<ResponseAggregate> {
        let current = self.response_repo.get_by_id(response_id).await?;
        if current.is_submitted() {
            return Err(AppError::ResponseAlreadySubmitted);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let outcome: AppResult<()> = async {
            self.apply_save(&txn, &current, &input.answers).await?;
            self.mirror.sync(&txn, response_id).await;
            if input.auto_save {
                self.response_repo
                    .touch_autosave(&txn, response_id, Utc::now())
                    .await?;
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                txn.commit()
                    .await
                    .map_err(|e| AppError::SaveFailed(e.to_string()))?;
                tracing::debug!(response_id, auto_save = input.auto_save, "Saved progress");
                let reloaded = self.response_repo.get_by_id(response_id).await?;
                self.load_aggregate(reloaded).await
            }
            Err(e) => {
                let _ = txn.rollback().await;
                Err(save_failure(e))
            }
        }
    }

    /// Submit the response: same save sequence, then required-question
    /// validation, then finalization. All-or-nothing: a validation failure
    /// discards the answers written in this same call.
    pub async fn submit(&self, response_id: &str, input: SubmitInput) -> AppResult<ResponseAggregate> {
        let current = self.response_repo.get_by_id(response_id).await?;
        if current.is_submitted() {
            return Err(AppError::AlreadySubmitted(
                current.submitted_at.map(|at| at.to_rfc3339()),
            ));
        }

        let activity = self.activity_repo.get_by_id(&current.activity_id).await?;

        // Fetch the questionnaire tree once per call and pass the snapshot
        // into validation; no ambient questionnaire state
        let snapshot = match activity.questionnaire_id.as_deref() {
            Some(questionnaire_id) => {
                Some(self.questionnaire_repo.load_snapshot(questionnaire_id).await?)
            }
            None => None,
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let outcome: AppResult<()> = async {
            let updated = self.apply_save(&txn, &current, &input.answers).await?;
            self.mirror.sync(&txn, response_id).await;

            if let Some(snapshot) = &snapshot {
                let answered = self
                    .answer_repo
                    .answered_question_ids(&txn, response_id)
                    .await?;
                let missing = missing_required(&snapshot.required_question_ids, &answered);
                if !missing.is_empty() {
                    return Err(AppError::MissingRequiredQuestions(missing));
                }
            }

            let now = Utc::now();
            let mut active: response::ActiveModel = updated.into();
            active.status = Set(response::STATUS_SUBMITTED.to_string());
            active.submitted_at = Set(Some(now));
            active.updated_at = Set(Some(now));
            self.response_repo.update(&txn, active).await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                txn.commit()
                    .await
                    .map_err(|e| AppError::SaveFailed(e.to_string()))?;
                tracing::info!(response_id, "Submitted response");
                let reloaded = self.response_repo.get_by_id(response_id).await?;
                self.load_aggregate(reloaded).await
            }
            Err(e) => {
                let _ = txn.rollback().await;
                Err(save_failure(e))
            }
        }
    }

    /// Get the current progress snapshot for a response.
    pub async fn progress(&self, response_id: &str) -> AppResult<(ResponseAggregate, ProgressReport)> {
        let current = self.response_repo.get_by_id(response_id).await?;
        let report = ProgressReport {
            total_questions: current.total_questions,
            answered_questions: current.answered_questions,
            completion_percentage: current.completion_percentage,
            status: current.status.clone(),
            last_saved_at: current.last_saved_at,
        };
        let aggregate = self.load_aggregate(current).await?;
        Ok((aggregate, report))
    }

    /// Duplicate-response lookup: by participant when one was supplied,
    /// else by guest identifier. Lookup-then-create without a unique
    /// constraint; concurrent starts for the same identity are accepted as
    /// a last-writer-wins race.
    async fn find_existing(
        &self,
        activity_id: &str,
        participant_id: Option<&str>,
        guest_identifier: Option<&str>,
    ) -> AppResult<Option<response::Model>> {
        if let Some(participant_id) = participant_id {
            return self
                .response_repo
                .find_by_participant(activity_id, participant_id)
                .await;
        }

        if let Some(guest_identifier) = guest_identifier {
            return self
                .response_repo
                .find_by_guest(activity_id, guest_identifier)
                .await;
        }

        Ok(None)
    }

    async fn load_aggregate(&self, response: response::Model) -> AppResult<ResponseAggregate> {
        let answers = self.answer_repo.find_by_response_id(&response.id).await?;
        Ok(ResponseAggregate { response, answers })
    }

    /// Upsert the answer batch, then recompute progress. Runs on the
    /// transaction connection.
    async fn apply_save<C: ConnectionTrait>(
        &self,
        conn: &C,
        response: &response::Model,
        batch: &[AnswerInput],
    ) -> AppResult<response::Model> {
        let now = Utc::now();

        for entry in batch {
            // The question's kind only informs value coercion here; required
            // flags are checked at submit time, not per save
            let question = self
                .questionnaire_repo
                .get_question(conn, &entry.question_id)
                .await
                .map_err(|e| match e {
                    AppError::NotFound(msg) => AppError::Validation(msg),
                    other => other,
                })?;

            let existing = self
                .answer_repo
                .find_by_response_and_question(conn, &response.id, &entry.question_id)
                .await?;

            match existing {
                Some(answer) => {
                    let revision = answer.revision_count + 1;
                    let mut active: answer::ActiveModel = answer.into();
                    apply_entry(&mut active, entry, &question);
                    active.revision_count = Set(revision);
                    active.updated_at = Set(Some(now));
                    self.answer_repo.update(conn, active).await?;
                }
                None => {
                    let mut active = answer::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        response_id: Set(response.id.clone()),
                        question_id: Set(entry.question_id.clone()),
                        value: Set(None),
                        value_array: Set(None),
                        value_translations: Set(None),
                        time_spent: Set(None),
                        revision_count: Set(0),
                        created_at: Set(now),
                        updated_at: Set(None),
                    };
                    apply_entry(&mut active, entry, &question);
                    self.answer_repo.create(conn, active).await?;
                }
            }
        }

        // Progress recompute: count distinct answer rows, derive percentage,
        // refresh last_saved_at on every save
        let answered = self.answer_repo.count_by_response(conn, &response.id).await? as i32;
        let mut active: response::ActiveModel = response.clone().into();
        active.answered_questions = Set(answered);
        active.completion_percentage = Set(completion_percentage(answered, response.total_questions));
        active.last_saved_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        self.response_repo.update(conn, active).await
    }
}

/// Apply one batch entry onto an answer row: value precedence, translation
/// replacement, time overwrite.
fn apply_entry(active: &mut answer::ActiveModel, entry: &AnswerInput, question: &question::Model) {
    if let Some(array) = &entry.value_array {
        set_coerced(active, JsonValue::Array(array.clone()), question);
    } else if let Some(value) = &entry.value {
        set_coerced(active, value.clone(), question);
    }

    if let Some(translations) = &entry.value_translations {
        active.value_translations = Set(Some(translations.clone()));
    }

    if let Some(seconds) = entry.time_spent {
        active.time_spent = Set(Some(seconds));
    }
}

/// Store a value according to the question's declared kind: array kinds get
/// the array column (scalars are wrapped), everything else is scalarized.
fn set_coerced(active: &mut answer::ActiveModel, value: JsonValue, question: &question::Model) {
    if question.is_array_kind() {
        let items = match value {
            JsonValue::Array(items) => items,
            other => vec![other],
        };
        active.value_array = Set(Some(JsonValue::Array(items)));
        active.value = Set(None);
    } else {
        active.value = Set(Some(scalar_to_string(value)));
        active.value_array = Set(None);
    }
}

fn scalar_to_string(value: JsonValue) -> String {
    match value {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}

/// Percentage of answered questions, two decimals; 0 when the questionnaire
/// has no questions.
fn completion_percentage(answered: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = f64::from(answered) / f64::from(total) * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Required ids minus answered ids. Row existence counts as answered even
/// when the row's value is empty; callers rely on this exact policy.
fn missing_required(required: &[String], answered: &[String]) -> Vec<String> {
    let answered: HashSet<&str> = answered.iter().map(String::as_str).collect();
    required
        .iter()
        .filter(|id| !answered.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Submit/save failures keep their domain kinds; everything else surfaces
/// as a save failure carrying the underlying message.
fn save_failure(error: AppError) -> AppError {
    match error {
        AppError::Validation(_) | AppError::MissingRequiredQuestions(_) => error,
        other => AppError::SaveFailed(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn question(kind: &str) -> question::Model {
        question::Model {
            id: "q1".to_string(),
            section_id: "sec1".to_string(),
            kind: kind.to_string(),
            title: "Q".to_string(),
            is_required: false,
            options: None,
            position: 0,
            created_at: Utc::now(),
        }
    }

    fn blank_active() -> answer::ActiveModel {
        answer::ActiveModel {
            id: Set("ans1".to_string()),
            response_id: Set("resp1".to_string()),
            question_id: Set("q1".to_string()),
            value: Set(None),
            value_array: Set(None),
            value_translations: Set(None),
            time_spent: Set(None),
            revision_count: Set(0),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
    }

    fn entry() -> AnswerInput {
        AnswerInput {
            question_id: "q1".to_string(),
            value: None,
            value_array: None,
            value_translations: None,
            time_spent: None,
        }
    }

    #[test]
    fn test_value_array_takes_precedence_over_value() {
        let mut active = blank_active();
        let mut input = entry();
        input.value = Some(json!("ignored"));
        input.value_array = Some(vec![json!("a"), json!("b")]);
        apply_entry(&mut active, &input, &question("checkbox"));

        assert_eq!(active.value_array.clone().unwrap(), Some(json!(["a", "b"])));
        assert_eq!(active.value.clone().unwrap(), None);
    }

    #[test]
    fn test_scalar_into_array_kind_is_wrapped() {
        let mut active = blank_active();
        let mut input = entry();
        input.value = Some(json!("only"));
        apply_entry(&mut active, &input, &question("multiselect"));

        assert_eq!(active.value_array.clone().unwrap(), Some(json!(["only"])));
        assert_eq!(active.value.clone().unwrap(), None);
    }

    #[test]
    fn test_scalar_kind_stores_stringified_value() {
        let mut active = blank_active();
        let mut input = entry();
        input.value = Some(json!(4));
        apply_entry(&mut active, &input, &question("rating"));

        assert_eq!(active.value.clone().unwrap(), Some("4".to_string()));
        assert_eq!(active.value_array.clone().unwrap(), None);
    }

    #[test]
    fn test_falsy_values_are_still_stored() {
        let mut active = blank_active();
        let mut input = entry();
        input.value = Some(json!(false));
        apply_entry(&mut active, &input, &question("text"));
        assert_eq!(active.value.clone().unwrap(), Some("false".to_string()));

        let mut active = blank_active();
        let mut input = entry();
        input.value = Some(json!(""));
        apply_entry(&mut active, &input, &question("text"));
        assert_eq!(active.value.clone().unwrap(), Some(String::new()));
    }

    #[test]
    fn test_entry_without_value_still_updates_time_and_translations() {
        let mut active = blank_active();
        let mut input = entry();
        input.time_spent = Some(42);
        input.value_translations = Some(json!({"fr": "bonjour"}));
        apply_entry(&mut active, &input, &question("text"));

        assert_eq!(active.value.clone().unwrap(), None);
        assert_eq!(active.time_spent.clone().unwrap(), Some(42));
        assert_eq!(
            active.value_translations.clone().unwrap(),
            Some(json!({"fr": "bonjour"}))
        );
    }

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(0, 0), 0.0);
        assert_eq!(completion_percentage(0, 3), 0.0);
        assert_eq!(completion_percentage(1, 3), 33.33);
        assert_eq!(completion_percentage(2, 3), 66.67);
        assert_eq!(completion_percentage(3, 3), 100.0);
    }

    #[test]
    fn test_missing_required_is_a_set_difference() {
        let required = vec!["q1".to_string(), "q2".to_string()];
        let answered = vec!["q2".to_string(), "q3".to_string()];
        assert_eq!(missing_required(&required, &answered), vec!["q1".to_string()]);

        // Row existence suffices: an answered required question passes even
        // if its stored value is empty, so only ids matter here
        let answered = vec!["q1".to_string(), "q2".to_string()];
        assert!(missing_required(&required, &answered).is_empty());
    }

    #[test]
    fn test_save_failure_preserves_domain_kinds() {
        let e = save_failure(AppError::MissingRequiredQuestions(vec!["q1".to_string()]));
        assert_eq!(e.error_code(), "MISSING_REQUIRED_QUESTIONS");

        let e = save_failure(AppError::Validation("bad".to_string()));
        assert_eq!(e.error_code(), "VALIDATION_ERROR");

        let e = save_failure(AppError::Database("connection reset".to_string()));
        assert_eq!(e.error_code(), "SAVE_FAILED");
        assert!(e.to_string().contains("connection reset"));
    }
}
