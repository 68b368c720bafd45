use super::lists::ListError;
use crate::remote::ApiMessage;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid token")]
    Unauthorized,

    #[error("400 Bad Request: Icon value <{0}> is already saved.")]
    AlreadySaved(String),

    #[error("Icon value <{0}> does not exist.")]
    NotSaved(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ListError> for ApiError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::AlreadySaved(value) => ApiError::AlreadySaved(value),
            ListError::NotSaved(value) => ApiError::NotSaved(value),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::AlreadySaved(_) => StatusCode::BAD_REQUEST,
            ApiError::NotSaved(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let ApiError::Internal(ref message) = self {
            tracing::error!("Request failed: {}", message);
        }

        (
            status,
            Json(ApiMessage {
                msg: self.to_string(),
            }),
        )
            .into_response()
    }
}
