//! API response payloads.
//!
//! Uniform body shapes for the response aggregate, shared across the
//! lifecycle and listing endpoints.

use canvass_core::{AnswerView, ProgressReport, ResponseAggregate, ResponseListItem};
use canvass_db::entities::{answer, response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// One answer row as exposed to clients.
#[derive(Debug, Serialize)]
pub struct AnswerPayload {
    pub id: String,
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_array: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_translations: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<i32>,
    pub revision_count: i32,
}

impl From<answer::Model> for AnswerPayload {
    fn from(answer: answer::Model) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            value: answer.value,
            value_array: answer.value_array,
            value_translations: answer.value_translations,
            time_spent: answer.time_spent,
            revision_count: answer.revision_count,
        }
    }
}

/// A response with its nested answers.
#[derive(Debug, Serialize)]
pub struct ResponsePayload {
    pub id: String,
    pub activity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_identifier: Option<String>,
    pub status: String,
    pub language: String,
    pub total_questions: i32,
    pub answered_questions: i32,
    pub completion_percentage: f64,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
    pub answers: Vec<AnswerPayload>,
}

impl From<ResponseAggregate> for ResponsePayload {
    fn from(aggregate: ResponseAggregate) -> Self {
        let response = aggregate.response;
        Self {
            id: response.id,
            activity_id: response.activity_id,
            participant_id: response.participant_id,
            guest_identifier: response.guest_identifier,
            status: response.status,
            language: response.language,
            total_questions: response.total_questions,
            answered_questions: response.answered_questions,
            completion_percentage: response.completion_percentage,
            started_at: response.started_at,
            last_saved_at: response.last_saved_at,
            submitted_at: response.submitted_at,
            metadata: response.metadata,
            answers: aggregate.answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Progress block for the progress endpoint.
#[derive(Debug, Serialize)]
pub struct ProgressPayload {
    pub total_questions: i32,
    pub answered_questions: i32,
    pub completion_percentage: f64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl From<ProgressReport> for ProgressPayload {
    fn from(report: ProgressReport) -> Self {
        Self {
            total_questions: report.total_questions,
            answered_questions: report.answered_questions,
            completion_percentage: report.completion_percentage,
            status: report.status,
            last_saved_at: report.last_saved_at,
        }
    }
}

/// One listed response with uniformly shaped answers.
#[derive(Debug, Serialize)]
pub struct ListedResponsePayload {
    pub id: String,
    pub activity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_identifier: Option<String>,
    pub status: String,
    pub total_questions: i32,
    pub answered_questions: i32,
    pub completion_percentage: f64,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub answers: Vec<ListedAnswerPayload>,
}

/// The `{question_id, value, value_array}` shape used by the listing.
#[derive(Debug, Serialize)]
pub struct ListedAnswerPayload {
    pub question_id: String,
    pub value: Option<JsonValue>,
    pub value_array: Option<JsonValue>,
}

impl From<AnswerView> for ListedAnswerPayload {
    fn from(view: AnswerView) -> Self {
        Self {
            question_id: view.question_id,
            value: view.value,
            value_array: view.value_array,
        }
    }
}

impl From<ResponseListItem> for ListedResponsePayload {
    fn from(item: ResponseListItem) -> Self {
        let response: response::Model = item.response;
        Self {
            id: response.id,
            activity_id: response.activity_id,
            participant_id: response.participant_id,
            guest_identifier: response.guest_identifier,
            status: response.status,
            total_questions: response.total_questions,
            answered_questions: response.answered_questions,
            completion_percentage: response.completion_percentage,
            started_at: response.started_at,
            submitted_at: response.submitted_at,
            answers: item.answers.into_iter().map(Into::into).collect(),
        }
    }
}
