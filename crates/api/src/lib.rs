//! HTTP API layer for canvass.
//!
//! This crate provides the REST API for the response-collection core:
//!
//! - **Endpoints**: start/resume/save/submit/progress plus per-activity
//!   listings and statistics
//! - **Payloads**: uniform response/answer body shapes
//! - **State**: shared application state wiring the core services
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
