//! API middleware and shared state.

use canvass_core::{ResponseService, StatisticsService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Response lifecycle service (start/resume/save/submit).
    pub response_service: ResponseService,
    /// Reporting service (listings and statistics).
    pub statistics_service: StatisticsService,
}
