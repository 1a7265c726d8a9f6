use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::domain::access::RedirectTarget;
use crate::domain::error::DomainError;
use crate::presentation::forms::FormView;
use crate::presentation::urls;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("form submission is invalid")]
    InvalidForm(Box<FormView>),

    #[error("login required")]
    LoginRequired,

    /// Path segments that do not parse (a non-numeric id) name no resource.
    #[error("no such path: {0}")]
    BadPath(#[from] PathRejection),

    #[error("malformed request body: {0}")]
    BadBody(#[from] JsonRejection),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_body(status: StatusCode, msg: String) -> Response {
    (status, Json(ErrorBody { error: msg })).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Domain(err) => match &err {
                DomainError::AccessDenied(target) => urls::redirect_to(target).into_response(),
                DomainError::Validation { .. } => {
                    error_body(StatusCode::BAD_REQUEST, err.to_string())
                }
                DomainError::InvalidCredentials => {
                    error_body(StatusCode::UNAUTHORIZED, err.to_string())
                }
                DomainError::AlreadyExists(_) => error_body(StatusCode::CONFLICT, err.to_string()),
                DomainError::NotFound(_) => error_body(StatusCode::NOT_FOUND, err.to_string()),
                DomainError::Unexpected(detail) => {
                    error!(error = %detail, "unexpected domain error");
                    error_body(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                }
            },
            AppError::InvalidForm(form) => (StatusCode::BAD_REQUEST, Json(*form)).into_response(),
            AppError::LoginRequired => {
                urls::redirect_to(&RedirectTarget::Login { next: None }).into_response()
            }
            AppError::BadPath(rejection) => {
                error_body(StatusCode::NOT_FOUND, rejection.body_text())
            }
            AppError::BadBody(rejection) => rejection.into_response(),
        }
    }
}
