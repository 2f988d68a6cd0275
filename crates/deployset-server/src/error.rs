//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("Delta is not compatible with Set")]
    IncompatibleDelta,
    #[error("{0}")]
    MergeFailed(String),
    #[error("request body was missing or malformed")]
    Unprocessable,
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// Maps a failed set lookup, logging anything that is not a plain miss.
    pub fn set_lookup(err: RepositoryError, org: &str, app: &str, id: &str) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound(format!(
                r#"Set with ID "{id}" not available in Application "{org}/{app}"."#
            )),
            other => {
                log::error!("set lookup failed for {org}/{app}/{id}: {other}");
                ApiError::Internal
            }
        }
    }

    /// Maps a failed delta lookup, logging anything that is not a plain miss.
    pub fn delta_lookup(err: RepositoryError, org: &str, app: &str, id: &str) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound(format!(
                r#"Delta with ID "{id}" not available in Application "{org}/{app}"."#
            )),
            other => {
                log::error!("delta lookup failed for {org}/{app}/{id}: {other}");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(message)).into_response()
            }
            ApiError::IncompatibleDelta => (
                StatusCode::BAD_REQUEST,
                Json("Delta is not compatible with Set"),
            )
                .into_response(),
            ApiError::MergeFailed(message) => {
                (StatusCode::BAD_REQUEST, Json(message)).into_response()
            }
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
