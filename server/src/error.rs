//! Error codes and HTTP error bodies.
//!
//! Every domain error implements [`ErrorCode`], which gives it a stable,
//! grepable code. [`ApiError`] turns any of them into a JSON response of the
//! form `{"error": message, "code": code}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use events::CodecError;
use serde_json::json;

use crate::services::polling::PollError;
use crate::services::store::StoreError;

/// Trait for errors that carry a machine-readable code.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for CodecError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Json(_) => "E_INVALID_JSON",
            Self::UnknownEvent(_) => "E_UNKNOWN_EVENT",
            Self::InvalidBoardId(_) => "E_INVALID_BOARD_ID",
            Self::InvalidStatus(_) => "E_INVALID_STATUS",
            Self::MissingField(_) => "E_MISSING_FIELD",
        }
    }
}

/// A rendered HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status, code: err.error_code(), message: err.to_string() }
    }

    pub fn bad_request(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message, "code": self.code }))).into_response()
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        Self::bad_request(&err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::PostNotFound(_) | StoreError::BoardNotFound(_) | StoreError::NoActiveBoard => {
                StatusCode::NOT_FOUND
            }
            StoreError::EmptyPost | StoreError::EmptyTitle => StatusCode::BAD_REQUEST,
        };
        Self::new(status, &err)
    }
}

impl From<PollError> for ApiError {
    fn from(err: PollError) -> Self {
        Self::new(StatusCode::NOT_FOUND, &err)
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
