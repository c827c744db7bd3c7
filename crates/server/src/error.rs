use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{models::board_config::ColumnConfigError, validation::EmptyFieldError};
use serde_json::json;
use services::services::{
    image::ImageError,
    onshape::{OnshapeAuthError, OnshapeError},
};
use thiserror::Error;

/// Request-boundary error type. Every variant renders as a JSON
/// `{"error": message}` body with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("not authenticated")]
    Unauthenticated,
    #[error(transparent)]
    Database(sqlx::Error),
    #[error(transparent)]
    Auth(#[from] OnshapeAuthError),
    #[error(transparent)]
    Onshape(#[from] OnshapeError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Database(error)
    }
}

impl From<EmptyFieldError> for ApiError {
    fn from(error: EmptyFieldError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

impl From<ColumnConfigError> for ApiError {
    fn from(error: ColumnConfigError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ApiError::Auth(OnshapeAuthError::NotAuthenticated)
            | ApiError::Auth(OnshapeAuthError::StateMismatch) => StatusCode::UNAUTHORIZED,
            ApiError::Onshape(OnshapeError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Image(ImageError::InvalidFilename) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
