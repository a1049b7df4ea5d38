//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `canvass_test`)
//!   `TEST_DB_PASSWORD` (default: `canvass_test`)
//!   `TEST_DB_NAME` (default: `canvass_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use canvass_db::entities::{activity, answer, participant, question, questionnaire, response, section};
use canvass_db::repositories::{
    ActivityRepository, AnswerRepository, ParticipantRepository, QuestionnaireRepository,
    ResponseRepository,
};
use canvass_db::test_utils::{TestDatabase, TestDbConfig};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::json;

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_migrations_apply_cleanly() {
    let db = TestDatabase::create_unique().await.unwrap();
    canvass_db::migrate(db.connection()).await.unwrap();
    db.drop_database().await.unwrap();
}

/// Seed one activity with a 3-question questionnaire (q1 required) and one
/// active participant. Returns (activity_id, participant_id, question ids).
async fn seed(conn: &DatabaseConnection) -> (String, String, Vec<String>) {
    let now = Utc::now();

    questionnaire::ActiveModel {
        id: Set("qn1".to_string()),
        title: Set("Onboarding survey".to_string()),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .unwrap();

    section::ActiveModel {
        id: Set("sec1".to_string()),
        questionnaire_id: Set("qn1".to_string()),
        title: Set("Section 1".to_string()),
        position: Set(0),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .unwrap();

    for (i, (kind, required)) in [("text", true), ("rating", false), ("checkbox", false)]
        .iter()
        .enumerate()
    {
        question::ActiveModel {
            id: Set(format!("q{}", i + 1)),
            section_id: Set("sec1".to_string()),
            kind: Set((*kind).to_string()),
            title: Set(format!("Question {}", i + 1)),
            is_required: Set(*required),
            options: Set(None),
            position: Set(i as i32),
            created_at: Set(now),
        }
        .insert(conn)
        .await
        .unwrap();
    }

    activity::ActiveModel {
        id: Set("act1".to_string()),
        questionnaire_id: Set(Some("qn1".to_string())),
        title: Set("Launch survey".to_string()),
        status: Set("published".to_string()),
        start_date: Set(Some(now - chrono::Duration::days(1))),
        end_date: Set(Some(now + chrono::Duration::days(1))),
        close_date: Set(None),
        allow_guests: Set(true),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();

    participant::ActiveModel {
        id: Set("part1".to_string()),
        activity_id: Set("act1".to_string()),
        name: Set(Some("Jo".to_string())),
        email: Set(None),
        status: Set("active".to_string()),
        is_guest: Set(false),
        is_preview: Set(false),
        is_anonymous: Set(false),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();

    (
        "act1".to_string(),
        "part1".to_string(),
        vec!["q1".to_string(), "q2".to_string(), "q3".to_string()],
    )
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_questionnaire_snapshot_counts() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    canvass_db::migrate(test_db.connection()).await.unwrap();
    seed(test_db.connection()).await;

    let db = Arc::new(test_db.conn);
    let repo = QuestionnaireRepository::new(db);

    let snapshot = repo.load_snapshot("qn1").await.unwrap();
    assert_eq!(snapshot.total_questions, 3);
    assert_eq!(snapshot.required_question_ids, vec!["q1".to_string()]);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_response_identity_lookup_and_answer_upsert() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    canvass_db::migrate(test_db.connection()).await.unwrap();
    let (activity_id, participant_id, questions) = seed(test_db.connection()).await;

    let db = Arc::new(test_db.conn);
    let response_repo = ResponseRepository::new(Arc::clone(&db));
    let answer_repo = AnswerRepository::new(Arc::clone(&db));

    let now = Utc::now();
    let created = response_repo
        .create(response::ActiveModel {
            id: Set("resp1".to_string()),
            activity_id: Set(activity_id.clone()),
            participant_id: Set(Some(participant_id.clone())),
            guest_identifier: Set(None),
            status: Set("in_progress".to_string()),
            language: Set("en".to_string()),
            total_questions: Set(3),
            answered_questions: Set(0),
            completion_percentage: Set(0.0),
            is_preview: Set(false),
            started_at: Set(now),
            last_saved_at: Set(None),
            submitted_at: Set(None),
            metadata: Set(None),
            answers: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        })
        .await
        .unwrap();

    // The duplicate-start lookup finds it by identity
    let found = response_repo
        .find_by_participant(&activity_id, &participant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);

    // First write inserts with revision 0
    answer_repo
        .create(
            db.as_ref(),
            answer::ActiveModel {
                id: Set("ans1".to_string()),
                response_id: Set("resp1".to_string()),
                question_id: Set(questions[0].clone()),
                value: Set(Some("first".to_string())),
                value_array: Set(None),
                value_translations: Set(None),
                time_spent: Set(Some(5)),
                revision_count: Set(0),
                created_at: Set(now),
                updated_at: Set(None),
            },
        )
        .await
        .unwrap();

    let existing = answer_repo
        .find_by_response_and_question(db.as_ref(), "resp1", &questions[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.revision_count, 0);

    // Update bumps revision, still one row for the pair
    let mut active: answer::ActiveModel = existing.clone().into();
    active.value = Set(Some("second".to_string()));
    active.revision_count = Set(existing.revision_count + 1);
    answer_repo.update(db.as_ref(), active).await.unwrap();

    assert_eq!(
        answer_repo.count_by_response(db.as_ref(), "resp1").await.unwrap(),
        1
    );
    let ids = answer_repo
        .answered_question_ids(db.as_ref(), "resp1")
        .await
        .unwrap();
    assert_eq!(ids, vec![questions[0].clone()]);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_answers_json_mirror_write_bypasses_updated_at() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    canvass_db::migrate(test_db.connection()).await.unwrap();
    let (activity_id, participant_id, _) = seed(test_db.connection()).await;

    let db = Arc::new(test_db.conn);
    let response_repo = ResponseRepository::new(Arc::clone(&db));

    let now = Utc::now();
    response_repo
        .create(response::ActiveModel {
            id: Set("resp1".to_string()),
            activity_id: Set(activity_id),
            participant_id: Set(Some(participant_id)),
            guest_identifier: Set(None),
            status: Set("in_progress".to_string()),
            language: Set("en".to_string()),
            total_questions: Set(3),
            answered_questions: Set(0),
            completion_percentage: Set(0.0),
            is_preview: Set(false),
            started_at: Set(now),
            last_saved_at: Set(None),
            submitted_at: Set(None),
            metadata: Set(None),
            answers: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        })
        .await
        .unwrap();

    let map = json!({"q1": "y", "q3": ["a", "b"]});
    response_repo
        .write_answers_json(db.as_ref(), "resp1", map.clone())
        .await
        .unwrap();

    let reloaded = response_repo.get_by_id("resp1").await.unwrap();
    assert_eq!(reloaded.answers, Some(map));
    // The mirror write is a bare column update; updated_at stays untouched
    assert!(reloaded.updated_at.is_none());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_activity_and_participant_scoping() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    canvass_db::migrate(test_db.connection()).await.unwrap();
    let (activity_id, participant_id, _) = seed(test_db.connection()).await;

    let db = Arc::new(test_db.conn);
    let activity_repo = ActivityRepository::new(Arc::clone(&db));
    let participant_repo = ParticipantRepository::new(Arc::clone(&db));

    let act = activity_repo.get_by_id(&activity_id).await.unwrap();
    assert!(act.can_accept_responses(Utc::now()));

    // A preview participant never counts as valid
    participant::ActiveModel {
        id: Set("part2".to_string()),
        activity_id: Set(activity_id.clone()),
        name: Set(None),
        email: Set(None),
        status: Set("active".to_string()),
        is_guest: Set(false),
        is_preview: Set(true),
        is_anonymous: Set(false),
        deleted_at: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db.as_ref())
    .await
    .unwrap();

    let valid = participant_repo.valid_ids(&activity_id).await.unwrap();
    assert_eq!(valid, vec![participant_id]);
}
