use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("You are already a member of this trip.")]
    AlreadyMember,

    #[error("You already have a pending request to join this trip.")]
    DuplicatePending,

    #[error("You are not a member of this trip")]
    Forbidden,

    #[error("Not found.")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error("A user with that username already exists.")]
    UsernameTaken,

    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,

    #[error("Missing authorization token")]
    MissingToken,

    #[error("Invalid authorization token")]
    InvalidToken,

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("password hash error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
}

impl AppError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::Invalid(detail.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::AlreadyMember
            | AppError::DuplicatePending
            | AppError::Invalid(_)
            | AppError::UsernameTaken => StatusCode::BAD_REQUEST,
            AppError::MissingToken | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Sqlx(e) => {
                error!("storage failure: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::PasswordHash(e) => {
                error!("password hash failure: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
