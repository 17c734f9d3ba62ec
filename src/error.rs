use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::types::activity::Timestamp;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid TCX: {0}")]
    InvalidTcx(String),
    #[error("Invalid FIT: {0}")]
    InvalidFit(String),
    #[error("No track points found in file")]
    EmptyFile,
    #[error("{record} #{index} is missing required field {field}")]
    MissingField {
        record: &'static str,
        index: usize,
        field: &'static str,
    },
    #[error("{record} #{index} has unparsable {field}: {value:?}")]
    InvalidField {
        record: &'static str,
        index: usize,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Heart-rate samples share timestamp {at}; cannot interpolate a zero-second gap")]
    DegenerateInterval { at: Timestamp },
    #[error("Lap starting at {lap_start} has zero total time; cannot compute average speed")]
    DivisionByZero { lap_start: Timestamp },
    #[error("Cannot advance past the last of {laps} laps")]
    LapBoundaryExhaustion { laps: usize },
    #[error("Lap source contains no laps")]
    NoLaps,
    #[error("Lap #{index} starts before the lap preceding it")]
    UnorderedLaps { index: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("TCX serialization failed: {0}")]
    Xml(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("Merge not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Parse(_) | AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Merge(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Write(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
