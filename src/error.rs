//! Error type shared by every domain operation.
//!
//! Callers only ever see three business kinds (`Validation`, `NotFound`,
//! `Conflict`) plus `Unauthorized` for credential checks. Storage failures are
//! logged and surfaced as an opaque 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad input shape or range (400)
    #[error("{0}")]
    Validation(String),

    /// Referenced entity is missing (404)
    #[error("{0}")]
    NotFound(String),

    /// Unique constraint or state precondition violated (409)
    #[error("{0}")]
    Conflict(String),

    /// Credential mismatch (401)
    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("Record not found".into()),
            other => AppError::Database(other),
        }
    }
}

/// Turns a missing row into a `NotFound` carrying `msg`, leaving other
/// storage errors alone.
pub trait OptionalRow<T> {
    fn or_not_found(self, msg: impl FnOnce() -> String) -> AppResult<T>;
}

impl<T> OptionalRow<T> for rusqlite::Result<T> {
    fn or_not_found(self, msg: impl FnOnce() -> String) -> AppResult<T> {
        match self {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(AppError::NotFound(msg())),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(target: "database", error = %e, "Database error occurred");
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
