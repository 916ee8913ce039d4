// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::QuestionBank,
        session::{AnswerRequest, AttachPaperRequest, NavigateRequest, SwitchSectionRequest},
    },
    session::ExamSession,
    state::{AppState, SessionStore},
};

/// Creates a new exam session in the `upload` phase.
pub async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = ExamSession::new(state.bank.clone(), &state.config);
    let snapshot = session.snapshot().await;
    state.sessions.insert(session).await?;

    tracing::info!("Created exam session {}", snapshot.id);

    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Returns the current view of a session, including live advisories.
pub async fn get_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    Ok(Json(session.snapshot().await))
}

/// Ends a session: stops its clock and forgets it.
pub async fn delete_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.remove(id).await?;
    session.end().await;

    tracing::info!("Ended exam session {}", id);

    Ok(StatusCode::NO_CONTENT)
}

/// Supplies the uploaded paper, moving the session to `ready`.
pub async fn attach_paper(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachPaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = sessions.get(id).await?;
    let snapshot = session.attach_paper(&payload.file_name).await?;
    Ok(Json(snapshot))
}

/// Clears the paper reference. Any attempt in progress is discarded.
pub async fn clear_paper(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    Ok(Json(session.clear_paper().await))
}

pub async fn start_test(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let snapshot = session.start().await?;
    Ok(Json(snapshot))
}

/// Records an answer.
///
/// * Free-text answers are capped at 500 (short) or 3000 (long) characters.
/// * Answers to locked questions are accepted but ignored.
pub async fn submit_answer(
    State(sessions): State<SessionStore>,
    State(bank): State<Arc<QuestionBank>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let question = bank.by_id(payload.question_id).ok_or_else(|| {
        AppError::BadRequest(format!("Question {} does not exist", payload.question_id))
    })?;

    if let Some(cap) = question.question_type.char_cap() {
        if payload.value.chars().count() > cap {
            return Err(AppError::BadRequest(format!(
                "Answer exceeds {} characters",
                cap
            )));
        }
    }

    let session = sessions.get(id).await?;
    let snapshot = session
        .select_answer(payload.question_id, payload.value)
        .await?;
    Ok(Json(snapshot))
}

pub async fn navigate(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let snapshot = session.navigate(payload.direction).await?;
    Ok(Json(snapshot))
}

/// Switches section. A locked target leaves the session unchanged and raises an advisory.
pub async fn switch_section(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SwitchSectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let snapshot = session.switch_section(payload.section).await?;
    Ok(Json(snapshot))
}

pub async fn submit_test(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    let snapshot = session.submit().await?;

    tracing::info!(
        "Session {} submitted with {} of {} questions attempted",
        id,
        snapshot.metrics.total_attempted,
        snapshot.metrics.total_attempted + snapshot.metrics.remaining
    );

    Ok(Json(snapshot))
}

/// Returns the latest progress metrics pushed by the engine.
pub async fn get_metrics(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions.get(id).await?;
    Ok(Json(session.metrics().await))
}
