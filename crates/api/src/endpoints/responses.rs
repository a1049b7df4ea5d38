//! Response collection endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use canvass_common::{AppError, AppResult};
use canvass_core::{
    AnswerInput, ListQuery, ResumeOutcome, SaveProgressInput, StartInput, StartOutcome,
    SubmitInput,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use validator::Validate;

use crate::{
    middleware::AppState,
    response::{ListedResponsePayload, ProgressPayload, ResponsePayload},
};

/// Create the responses router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activities/{activity_id}/responses/start", post(start_response))
        .route("/activities/{activity_id}/responses/resume", post(resume_response))
        .route("/activities/{activity_id}/responses", get(list_responses))
        .route(
            "/activities/{activity_id}/responses/statistics",
            get(response_statistics),
        )
        .route("/responses/{response_id}/save", post(save_progress))
        .route("/responses/{response_id}/submit", post(submit_response))
        .route("/responses/{response_id}/progress", get(get_progress))
}

/// Start request.
#[derive(Debug, Deserialize, Validate)]
pub struct StartRequest {
    pub participant_id: Option<String>,
    #[validate(length(max = 255))]
    pub guest_identifier: Option<String>,
    #[validate(length(max = 10))]
    pub language: Option<String>,
    pub metadata: Option<JsonValue>,
}

/// Resume request.
#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub participant_id: Option<String>,
    pub guest_identifier: Option<String>,
}

/// One answer entry in a save/submit batch.
#[derive(Debug, Deserialize)]
pub struct AnswerEntry {
    pub question_id: String,
    pub value: Option<JsonValue>,
    pub value_array: Option<Vec<JsonValue>>,
    pub value_translations: Option<JsonValue>,
    pub time_spent: Option<i32>,
}

impl From<AnswerEntry> for AnswerInput {
    fn from(entry: AnswerEntry) -> Self {
        Self {
            question_id: entry.question_id,
            value: entry.value,
            value_array: entry.value_array,
            value_translations: entry.value_translations,
            time_spent: entry.time_spent,
        }
    }
}

/// Save progress request.
#[derive(Debug, Deserialize)]
pub struct SaveProgressRequest {
    pub answers: Vec<AnswerEntry>,
    #[serde(default)]
    pub auto_save: bool,
}

/// Submit request.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub answers: Vec<AnswerEntry>,
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListResponsesQuery {
    pub status: Option<String>,
    pub participant_id: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
}

const fn default_page() -> u64 {
    1
}

/// Body for start/resume outcomes.
#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    pub message: String,
    pub response: ResponsePayload,
    pub is_resume: bool,
}

/// Start a new response, or resume the identity's existing one.
async fn start_response(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
    Json(req): Json<StartRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let input = StartInput {
        participant_id: req.participant_id,
        guest_identifier: req.guest_identifier,
        language: req.language,
        metadata: req.metadata,
    };

    let outcome = state.response_service.start(&activity_id, input).await?;

    Ok(match outcome {
        StartOutcome::Started(aggregate) => (
            StatusCode::CREATED,
            Json(LifecycleResponse {
                message: "Response started successfully".to_string(),
                response: aggregate.into(),
                is_resume: false,
            }),
        )
            .into_response(),
        StartOutcome::Resumed(aggregate) => Json(LifecycleResponse {
            message: "Resuming existing response".to_string(),
            response: aggregate.into(),
            is_resume: true,
        })
        .into_response(),
        StartOutcome::AlreadySubmitted(aggregate) => already_submitted_body(aggregate),
    })
}

/// Resume an in-progress response; never creates one.
async fn resume_response(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
    Json(req): Json<ResumeRequest>,
) -> AppResult<Response> {
    let input = StartInput {
        participant_id: req.participant_id,
        guest_identifier: req.guest_identifier,
        ..StartInput::default()
    };

    let outcome = state.response_service.resume(&activity_id, input).await?;

    Ok(match outcome {
        ResumeOutcome::Resumed(aggregate) => Json(LifecycleResponse {
            message: "Resumed response successfully".to_string(),
            response: aggregate.into(),
            is_resume: true,
        })
        .into_response(),
        ResumeOutcome::AlreadySubmitted(aggregate) => already_submitted_body(aggregate),
    })
}

/// Already-submitted outcomes return the conflict error together with the
/// existing response so the client can show it.
fn already_submitted_body(aggregate: canvass_core::ResponseAggregate) -> Response {
    let submitted_at = aggregate.response.submitted_at.map(|at| at.to_rfc3339());
    let error = AppError::AlreadySubmitted(submitted_at);
    let payload: ResponsePayload = aggregate.into();
    (
        StatusCode::CONFLICT,
        Json(json!({
            "error": {
                "code": error.error_code(),
                "message": error.to_string(),
            },
            "response": payload,
        })),
    )
        .into_response()
}

/// Save body.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub message: String,
    pub response: ResponsePayload,
    pub auto_saved: bool,
}

/// Save an answer batch (autosave or manual).
async fn save_progress(
    State(state): State<AppState>,
    Path(response_id): Path<String>,
    Json(req): Json<SaveProgressRequest>,
) -> AppResult<Json<SaveResponse>> {
    let auto_save = req.auto_save;
    let input = SaveProgressInput {
        answers: req.answers.into_iter().map(Into::into).collect(),
        auto_save,
    };

    let aggregate = state.response_service.save_progress(&response_id, input).await?;

    Ok(Json(SaveResponse {
        message: "Progress saved successfully".to_string(),
        response: aggregate.into(),
        auto_saved: auto_save,
    }))
}

/// Submit body.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub response: ResponsePayload,
}

/// Submit the final response.
async fn submit_response(
    State(state): State<AppState>,
    Path(response_id): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> AppResult<Json<SubmitResponse>> {
    let input = SubmitInput {
        answers: req.answers.into_iter().map(Into::into).collect(),
    };

    let aggregate = state.response_service.submit(&response_id, input).await?;

    Ok(Json(SubmitResponse {
        message: "Response submitted successfully".to_string(),
        response: aggregate.into(),
    }))
}

/// Progress body.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub response: ResponsePayload,
    pub progress: ProgressPayload,
}

/// Get response progress.
async fn get_progress(
    State(state): State<AppState>,
    Path(response_id): Path<String>,
) -> AppResult<Json<ProgressResponse>> {
    let (aggregate, report) = state.response_service.progress(&response_id).await?;

    Ok(Json(ProgressResponse {
        response: aggregate.into(),
        progress: report.into(),
    }))
}

/// Listing body.
#[derive(Debug, Serialize)]
pub struct ListResponsesResponse {
    pub data: Vec<ListedResponsePayload>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// List an activity's responses.
async fn list_responses(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
    Query(query): Query<ListResponsesQuery>,
) -> AppResult<Json<ListResponsesResponse>> {
    let listing = state
        .statistics_service
        .index(
            &activity_id,
            ListQuery {
                status: query.status,
                participant_id: query.participant_id,
                page: query.page,
                per_page: query.per_page,
            },
        )
        .await?;

    Ok(Json(ListResponsesResponse {
        data: listing.items.into_iter().map(Into::into).collect(),
        total: listing.total,
        page: listing.page,
        per_page: listing.per_page,
    }))
}

/// Statistics body.
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub total_responses: u64,
    pub submitted: u64,
    pub in_progress: u64,
    pub anonymous_responses: u64,
    pub registered_responses: u64,
    pub average_completion: f64,
    pub average_time_per_answer: f64,
}

/// Get aggregate statistics for an activity's responses.
async fn response_statistics(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
) -> AppResult<Json<StatisticsResponse>> {
    let stats = state.statistics_service.statistics(&activity_id).await?;

    Ok(Json(StatisticsResponse {
        total_responses: stats.total_responses,
        submitted: stats.submitted,
        in_progress: stats.in_progress,
        anonymous_responses: stats.anonymous_responses,
        registered_responses: stats.registered_responses,
        average_completion: stats.average_completion,
        average_time_per_answer: stats.average_time_per_answer,
    }))
}
