use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::domain::access::RedirectTarget;
use crate::infrastructure::jwt::token_from_cookie_header;
use crate::presentation::AppState;
use crate::presentation::app_error::AppError;
use crate::presentation::urls;

#[derive(Debug, Clone, Copy)]
pub(crate) struct AuthenticatedUser {
    pub(crate) user_id: i64,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AppError::LoginRequired)
    }
}

/// The current user when there is one; public pages take this.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Viewer(pub(crate) Option<AuthenticatedUser>);

impl Viewer {
    pub(crate) fn user_id(&self) -> Option<i64> {
        self.0.map(|user| user.user_id)
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(parts.extensions.get::<AuthenticatedUser>().copied()))
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    let mut parts = auth_header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

fn cookie_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(token_from_cookie_header)
}

/// Resolves the session for every request. A missing, malformed or expired
/// token leaves the request anonymous.
pub(crate) async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(&request)
        .or_else(|| cookie_token(&request))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.auth_service.jwt().verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthenticatedUser {
                    user_id: claims.user_id,
                });
            }
            Err(err) => debug!(error = %err, "ignoring invalid session token"),
        }
    }

    next.run(request).await
}

/// Sends anonymous visitors to the login page, remembering where they were
/// headed.
pub(crate) async fn login_required(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_some() {
        return next.run(request).await;
    }

    let next_path = request
        .uri()
        .path_and_query()
        .map(|path| path.as_str().to_string());
    urls::redirect_to(&RedirectTarget::Login { next: next_path }).into_response()
}
