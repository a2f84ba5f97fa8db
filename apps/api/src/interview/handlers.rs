use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::session::{Session, SessionView};
use crate::interview::stage::Stage;
use crate::report::Report;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub stage: Stage,
    pub messages: Vec<String>,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub session_id: Uuid,
    pub replies: Vec<String>,
    pub stage: Stage,
    pub done: bool,
    pub report_ready: bool,
}

/// A path id that is not a UUID is reported as an unknown session.
fn session_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::NotFound(format!("Session not found: {}", e.body_text())))
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<Mutex<Session>>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let session = state.engine.start_session();
    let response = CreateSessionResponse {
        session_id: session.id,
        stage: session.stage(),
        messages: session.transcript().assistant_texts_since(0),
    };
    state.sessions.insert(session).await;
    info!("{} active sessions", state.sessions.len().await);
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SessionView>, AppError> {
    let id = session_id(path)?;
    let session = find_session(&state, id).await?;
    let view = session.lock().await.view(Utc::now());
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/messages
pub async fn handle_post_message(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = session_id(path)?;
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be blank".to_string()));
    }

    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let replies = state.engine.handle_input(&mut session, &req.text).await?;
    let stage = session.stage();
    if stage.is_terminal() {
        info!("Session {id} finished after {:?}", session.stage_history());
    }

    Ok(Json(MessageResponse {
        session_id: id,
        replies,
        stage,
        done: stage.is_terminal(),
        report_ready: session.report().is_some(),
    }))
}

/// GET /api/v1/sessions/:id/report
pub async fn handle_get_report(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Report>, AppError> {
    let id = session_id(path)?;
    let session = find_session(&state, id).await?;
    let session = session.lock().await;
    let artifacts = session
        .report()
        .ok_or_else(|| AppError::NotFound(format!("No report has been written for session {id}")))?;
    Ok(Json(artifacts.report.clone()))
}

/// GET /api/v1/sessions/:id/report.pdf
pub async fn handle_get_report_pdf(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let id = session_id(path)?;
    let session = find_session(&state, id).await?;
    let artifacts = session
        .lock()
        .await
        .report()
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("No report has been written for session {id}")))?;

    let disposition = format!(
        "attachment; filename=\"{}_report.pdf\"",
        artifacts.report.file_stem()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifacts.pdf.clone(),
    )
        .into_response())
}
