use crate::config::Config;
use crate::interview::controller::InterviewEngine;
use crate::interview::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub engine: InterviewEngine,
    pub config: Config,
}
