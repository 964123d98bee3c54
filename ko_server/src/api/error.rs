//! Mapping of engine errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use knockout::{ErrorKind, TournamentError};
use serde::Serialize;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// Failure of an API handler
#[derive(Debug)]
pub enum ApiError {
    /// Engine or actor failure
    Tournament(TournamentError),
    /// Request body or path did not make sense
    BadRequest(String),
    /// Missing or wrong admin token
    Unauthorized,
}

impl From<TournamentError> for ApiError {
    fn from(err: TournamentError) -> Self {
        ApiError::Tournament(err)
    }
}

/// HTTP status for an engine error
pub fn status_for(err: &TournamentError) -> StatusCode {
    match err {
        TournamentError::MatchNotFound(_) | TournamentError::ParticipantNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        TournamentError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => match err.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::State | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        },
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::State => "state",
        ErrorKind::Conflict => "conflict",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Unavailable => "unavailable",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Tournament(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "Tournament operation failed");
                } else {
                    tracing::debug!(error = %err, "Tournament operation rejected");
                }
                (
                    status,
                    ErrorResponse {
                        error: err.client_message(),
                        kind: kind_label(err.kind()),
                    },
                )
            }
            ApiError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: reason,
                    kind: kind_label(ErrorKind::Validation),
                },
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Admin token required".to_string(),
                    kind: "unauthorized",
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
