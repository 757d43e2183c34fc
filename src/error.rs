//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a caller can observe maps to exactly one variant, and every variant
//! maps to exactly one HTTP status.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can return
//! `Result<_, AppError>` and let Actix render `{"error": "<message>"}` bodies.
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `bcrypt::BcryptError` and `reqwest::Error` allow propagation with `?`.

use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// A uniqueness rule was violated, e.g. the username is already taken.
    /// Surfaced as HTTP 400 to match the registration contract.
    #[error("{0}")]
    Conflict(String),
    /// Missing, malformed or expired credentials (HTTP 401 with a Bearer challenge).
    #[error("{0}")]
    Unauthenticated(String),
    /// The caller is authenticated but lacks the required role (HTTP 403).
    #[error("{0}")]
    Forbidden(String),
    /// The resource does not exist or is not visible to the caller (HTTP 404).
    #[error("{0}")]
    NotFound(String),
    /// The OAuth provider rejected the code exchange or profile lookup (HTTP 400).
    #[error("{0}")]
    UpstreamFailure(String),
    /// A feature was requested that the deployment has not configured (HTTP 500).
    #[error("{0}")]
    Unconfigured(String),
    /// Malformed request that is not a field validation failure (HTTP 400).
    #[error("{0}")]
    BadRequest(String),
    /// Field validation failed (HTTP 422 Unprocessable Entity).
    #[error("{0}")]
    ValidationError(String),
    /// Storage failure (HTTP 500). The detail is logged, never returned.
    #[error("Database error: {0}")]
    DatabaseError(String),
    /// Any other server-side failure (HTTP 500).
    #[error("{0}")]
    InternalServerError(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Conflict(_) | AppError::BadRequest(_) | AppError::UpstreamFailure(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unconfigured(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        let message = match self {
            AppError::Unauthenticated(msg) => {
                builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
                msg.clone()
            }
            AppError::DatabaseError(msg) => {
                log::error!("database error: {}", msg);
                "Internal database error".to_string()
            }
            other => other.to_string(),
        };
        builder.json(json!({ "error": message }))
    }
}

/// `RowNotFound` becomes `NotFound`; everything else is a storage failure.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("Password hashing failed: {}", error))
    }
}

/// Transport failures talking to the OAuth provider.
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> AppError {
        AppError::UpstreamFailure(format!("OAuth provider request failed: {}", error))
    }
}
