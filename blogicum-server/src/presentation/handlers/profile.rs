use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::access::RedirectTarget;
use crate::domain::user::{ProfileUpdateRequest, User};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::forms::{FormView, USER_FORM};
use crate::presentation::handlers::posts::{PageQuery, PostPageDto};
use crate::presentation::middleware::auth::{AuthenticatedUser, Viewer};
use crate::presentation::urls;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub(crate) struct ProfileFormDto {
    pub(crate) email: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub(crate) first_name: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub(crate) last_name: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub(crate) username: String,
}

impl From<User> for ProfileFormDto {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ProfileDto {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) date_joined: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ProfilePageDto {
    pub(crate) profile: ProfileDto,
    /// Whether the viewer is looking at their own profile; hidden posts are
    /// listed only then.
    pub(crate) is_owner: bool,
    #[serde(flatten)]
    pub(crate) feed: PostPageDto,
}

#[utoipa::path(
    get,
    path = "/profile/{username}",
    tag = "profile",
    params(
        ("username" = String, Path, description = "Username"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Profile and its feed page", body = ProfilePageDto),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn profile(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProfilePageDto>> {
    let feed = state
        .blog_service
        .list_profile_posts(&username, viewer.user_id(), query.page.as_deref())
        .await?;

    let user = feed.profile;
    Ok(Json(ProfilePageDto {
        is_owner: viewer.user_id() == Some(user.id),
        profile: ProfileDto {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            date_joined: user.created_at,
        },
        feed: PostPageDto::from(feed.page),
    }))
}

#[utoipa::path(
    get,
    path = "/edit_profile",
    tag = "profile",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    responses(
        (status = 200, description = "Profile form bound to the current user", body = FormView),
        (status = 303, description = "Login required")
    )
)]
pub(crate) async fn edit_profile_form(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<FormView>> {
    let user = state.auth_service.get_user(auth.user_id).await?;
    Ok(Json(USER_FORM.bound(&ProfileFormDto::from(user))))
}

#[utoipa::path(
    post,
    path = "/edit_profile",
    tag = "profile",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    request_body = ProfileFormDto,
    responses(
        (status = 303, description = "Updated; redirect to the profile"),
        (status = 400, description = "Form with errors", body = FormView)
    )
)]
pub(crate) async fn edit_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<ProfileFormDto>,
) -> AppResult<Redirect> {
    USER_FORM.check(&dto)?;
    let req = ProfileUpdateRequest {
        email: dto.email.clone(),
        first_name: dto.first_name.clone(),
        last_name: dto.last_name.clone(),
        username: dto.username.clone(),
    };
    let user = state
        .auth_service
        .update_profile(auth.user_id, req)
        .await
        .map_err(|err| USER_FORM.reject(&dto, err))?;

    Ok(urls::redirect_to(&RedirectTarget::Profile {
        username: user.username,
    }))
}
