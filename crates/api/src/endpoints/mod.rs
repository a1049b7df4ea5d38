//! API endpoints.

mod responses;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new().merge(responses::router())
}
