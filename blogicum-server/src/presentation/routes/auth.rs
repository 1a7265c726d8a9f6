use axum::{
    Router,
    routing::{get, post},
};

use crate::presentation::AppState;
use crate::presentation::handlers::auth::{
    login, login_form, logout, register, registration_form,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/registration", get(registration_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
}
