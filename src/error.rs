use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};
use crate::roles::Role;
use crate::workflow::OrderStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not Found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Account exists but does not hold the `{0}` role")]
    RoleNotFound(Role),

    #[error("Account already holds the `{0}` role")]
    RoleAlreadyExists(Role),

    #[error("Role `{0}` is not held by this account")]
    RoleNotHeld(Role),

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error("Status change from `{from}` to `{to}` is not permitted")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order changed since it was read, retry with the current status")]
    Conflict,

    #[error("Bad Request: {0}")]
    Validation(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable kind; the client maps these to
    /// navigation (sign-up screen, verify-email prompt) instead of a
    /// generic error toast.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden => "forbidden",
            AppError::NotFound => "not_found",
            AppError::UserNotFound => "user_not_found",
            AppError::RoleNotFound(_) => "role_not_found",
            AppError::RoleAlreadyExists(_) => "role_already_exists",
            AppError::RoleNotHeld(_) => "role_not_held",
            AppError::EmailNotVerified => "email_not_verified",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::Conflict => "conflict",
            AppError::Validation(_) => "validation_error",
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => "internal",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::RoleNotFound(_) => StatusCode::FORBIDDEN,
            AppError::RoleAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::RoleNotHeld(_) => StatusCode::FORBIDDEN,
            AppError::EmailNotVerified => StatusCode::FORBIDDEN,
            AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    kind: &'static str,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                kind: self.kind(),
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
