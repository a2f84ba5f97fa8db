pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route("/api/v1/sessions/:id", get(handlers::handle_get_session))
        .route(
            "/api/v1/sessions/:id/messages",
            post(handlers::handle_post_message),
        )
        .route("/api/v1/sessions/:id/report", get(handlers::handle_get_report))
        .route(
            "/api/v1/sessions/:id/report.pdf",
            get(handlers::handle_get_report_pdf),
        )
        .with_state(state)
}
