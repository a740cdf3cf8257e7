use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Rejections raised while checking request payloads.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    #[error("{0} must be a finite number")]
    NotANumber(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("'{0}' is not a valid 3-letter currency code")]
    Currency(String),

    #[error("'{0}' is not a valid email address")]
    Email(String),

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Percentage {0} is outside 0..=100")]
    Percentage(f64),

    #[error("Duplicate id '{0}'")]
    DuplicateId(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database operation failed: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("You are not allowed to access this user")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Store(StoreError),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn missing_user(user_id: &str) -> Self {
        ApiError::NotFound(format!("User '{user_id}' not found"))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => ApiError::Conflict(err.to_string()),
            err => ApiError::Store(err),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    error: &'static str,
    message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Store(err) => error!(%err, "Record store failure"),
            ApiError::Internal(detail) => error!(%detail, "Internal failure"),
            _ => {}
        }
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorBody {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error"),
            message: self.to_string(),
        })
    }
}
