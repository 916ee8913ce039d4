// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::engine::Phase;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (operation not allowed in the current exam phase)
    Conflict(String),

    // 503 Service Unavailable (session capacity reached)
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Rejections raised by the exam engine.
///
/// Advisory outcomes (locked section, boundary navigation, answering a locked
/// question) are not errors; they come back as events or silent no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamError {
    /// The operation is not valid in the current phase.
    InvalidPhase(Phase),

    /// The operation requires a running test.
    NotInProgress(Phase),

    UnknownQuestion(u32),

    /// An MCQ answer that is not one of the rendered options.
    InvalidOption { question_id: u32, value: String },

    /// The question bank violates the paper layout.
    InvalidBank(String),
}

impl fmt::Display for ExamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamError::InvalidPhase(phase) => {
                write!(f, "Operation not allowed while the exam is in phase '{}'", phase)
            }
            ExamError::NotInProgress(phase) => {
                write!(f, "No test in progress (current phase '{}')", phase)
            }
            ExamError::UnknownQuestion(id) => write!(f, "Question {} does not exist", id),
            ExamError::InvalidOption { question_id, value } => write!(
                f,
                "'{}' is not an option of question {}",
                value, question_id
            ),
            ExamError::InvalidBank(msg) => write!(f, "Invalid question bank: {}", msg),
        }
    }
}

impl std::error::Error for ExamError {}

/// Converts engine rejections into HTTP errors so handlers can use `?`.
impl From<ExamError> for AppError {
    fn from(err: ExamError) -> Self {
        match err {
            ExamError::InvalidPhase(_) | ExamError::NotInProgress(_) => {
                AppError::Conflict(err.to_string())
            }
            ExamError::UnknownQuestion(_)
            | ExamError::InvalidOption { .. }
            | ExamError::InvalidBank(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
