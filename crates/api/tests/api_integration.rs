//! API integration tests.
//!
//! These tests verify the endpoints wire together correctly over a mock
//! database: routing, extraction, and error mapping.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use canvass_api::{middleware::AppState, router as api_router};
use canvass_core::{AnswerMirror, ResponseService, StatisticsService};
use canvass_db::repositories::{
    ActivityRepository, AnswerRepository, ParticipantRepository, QuestionnaireRepository,
    ResponseRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::sync::Arc;
use tower::ServiceExt;

/// Create a mock database connection that answers every query with an empty
/// result set.
fn create_mock_db() -> DatabaseConnection {
    let mut mock = MockDatabase::new(DatabaseBackend::Postgres);
    // Enough empty result sets for any single handler's query sequence
    for _ in 0..8 {
        mock = mock.append_query_results([Vec::<canvass_db::entities::response::Model>::new()]);
    }
    mock.into_connection()
}

/// Create test app state backed by a mock database.
fn create_test_state() -> AppState {
    let db = Arc::new(create_mock_db());

    let activity_repo = ActivityRepository::new(Arc::clone(&db));
    let participant_repo = ParticipantRepository::new(Arc::clone(&db));
    let questionnaire_repo = QuestionnaireRepository::new(Arc::clone(&db));
    let response_repo = ResponseRepository::new(Arc::clone(&db));
    let answer_repo = AnswerRepository::new(Arc::clone(&db));

    let mirror = AnswerMirror::new(response_repo.clone(), answer_repo.clone());
    let response_service = ResponseService::new(
        Arc::clone(&db),
        activity_repo.clone(),
        questionnaire_repo,
        response_repo.clone(),
        answer_repo.clone(),
        mirror,
    );
    let statistics_service =
        StatisticsService::new(activity_repo, participant_repo, response_repo, answer_repo);

    AppState {
        response_service,
        statistics_service,
    }
}

/// Create the test router.
fn create_test_router() -> Router {
    let state = create_test_state();
    api_router().with_state(state)
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_progress_for_unknown_response_returns_404() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/responses/missing/progress")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_start_against_unknown_activity_returns_404() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/activities/missing/responses/start")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"guest_identifier":"g-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_for_unknown_response_returns_404() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/responses/missing/save")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"answers":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_with_malformed_body_is_rejected() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/responses/resp1/save")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"answers":"not an array"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Axum's Json extractor rejects before the handler runs
    let status = response.status();
    assert!(
        status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY,
        "unexpected status: {status}"
    );
}
