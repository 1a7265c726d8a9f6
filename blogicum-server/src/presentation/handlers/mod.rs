use axum::extract::FromRequestParts;

use crate::presentation::app_error::AppError;

pub(crate) mod auth;
pub(crate) mod comments;
pub(crate) mod posts;
pub(crate) mod profile;

/// Numeric path ids; a segment that does not parse is a 404.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub(crate) struct IdPath<T>(pub(crate) T);
