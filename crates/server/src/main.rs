//! Canvass server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use canvass_api::{middleware::AppState, router as api_router};
use canvass_common::Config;
use canvass_core::{AnswerMirror, ResponseService, StatisticsService};
use canvass_db::repositories::{
    ActivityRepository, AnswerRepository, ParticipantRepository, QuestionnaireRepository,
    ResponseRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canvass=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting canvass server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = canvass_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    canvass_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let activity_repo = ActivityRepository::new(Arc::clone(&db));
    let participant_repo = ParticipantRepository::new(Arc::clone(&db));
    let questionnaire_repo = QuestionnaireRepository::new(Arc::clone(&db));
    let response_repo = ResponseRepository::new(Arc::clone(&db));
    let answer_repo = AnswerRepository::new(Arc::clone(&db));

    // Initialize services
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

    // Create app state
    let state = AppState {
        response_service,
        statistics_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
