use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::job::JobError;
use crate::notes::NoteError;
use crate::summarize::SummarizeError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Caller(msg) => ApiError::BadRequest(msg),
            JobError::Resource(msg) => ApiError::Internal(msg),
            JobError::Transport(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::NotFound(name) => ApiError::NotFound(format!("Note not found: {}", name)),
            NoteError::InvalidName(name) => ApiError::BadRequest(format!("Invalid filename: {}", name)),
            NoteError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<SummarizeError> for ApiError {
    fn from(err: SummarizeError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
