use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::user::{LoginRequest, RegisterRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::forms::{FormView, LOGIN_FORM, REGISTRATION_FORM};
use crate::presentation::urls;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub(crate) struct RegistrationFormDto {
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub(crate) username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub(crate) password1: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub(crate) password2: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub(crate) struct LoginFormDto {
    pub(crate) username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct NextQuery {
    /// Local path to continue to after login.
    pub(crate) next: Option<String>,
}

#[utoipa::path(
    get,
    path = "/auth/registration",
    tag = "auth",
    responses((status = 200, description = "Empty registration form", body = FormView))
)]
pub(crate) async fn registration_form() -> Json<FormView> {
    Json(REGISTRATION_FORM.unbound())
}

#[utoipa::path(
    post,
    path = "/auth/registration",
    tag = "auth",
    request_body = RegistrationFormDto,
    responses(
        (status = 303, description = "Registered and signed in; redirect to the feed"),
        (status = 400, description = "Form with errors", body = FormView),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    Json(dto): Json<RegistrationFormDto>,
) -> AppResult<impl IntoResponse> {
    REGISTRATION_FORM.check(&dto)?;
    let req = RegisterRequest {
        username: dto.username.clone(),
        password1: dto.password1.clone(),
        password2: dto.password2.clone(),
    };
    let result = state
        .auth_service
        .register(req)
        .await
        .map_err(|err| REGISTRATION_FORM.reject(&dto, err))?;
    debug!(user_id = result.user.id, "session cookie issued");

    let cookie = state.auth_service.jwt().session_cookie(&result.access_token);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(urls::INDEX)))
}

#[utoipa::path(
    get,
    path = "/auth/login",
    tag = "auth",
    params(NextQuery),
    responses((status = 200, description = "Empty login form", body = FormView))
)]
pub(crate) async fn login_form() -> Json<FormView> {
    Json(LOGIN_FORM.unbound())
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    params(NextQuery),
    request_body = LoginFormDto,
    responses(
        (status = 303, description = "Signed in; redirect to `next` or the feed"),
        (status = 400, description = "Form with errors", body = FormView),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Json(dto): Json<LoginFormDto>,
) -> AppResult<impl IntoResponse> {
    LOGIN_FORM.check(&dto)?;
    let req = LoginRequest {
        username: dto.username.clone(),
        password: dto.password.clone(),
    };
    let result = state
        .auth_service
        .login(req)
        .await
        .map_err(|err| LOGIN_FORM.reject(&dto, err))?;
    debug!(user_id = result.user.id, "session cookie issued");

    let cookie = state.auth_service.jwt().session_cookie(&result.access_token);
    let next = query
        .next
        .as_deref()
        .and_then(urls::local_path)
        .unwrap_or(urls::INDEX);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(next)))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses((status = 303, description = "Session cleared; redirect to the feed"))
)]
pub(crate) async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = state.auth_service.jwt().expired_session_cookie();
    ([(header::SET_COOKIE, cookie)], Redirect::to(urls::INDEX))
}
