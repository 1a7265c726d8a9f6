use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::access::RedirectTarget;
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::forms::{COMMENT_FORM, FormView};
use crate::presentation::handlers::IdPath;
use crate::presentation::middleware::auth::AuthenticatedUser;
use crate::presentation::urls;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub(crate) struct CommentFormDto {
    #[validate(length(min = 1, message = "This field is required."))]
    pub(crate) text: String,
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/comment",
    tag = "comments",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    params(("post_id" = i64, Path, description = "Post id")),
    request_body = CommentFormDto,
    responses(
        (status = 303, description = "Comment added; redirect to the post"),
        (status = 400, description = "Form with errors", body = FormView),
        (status = 404, description = "Post missing or not publicly visible")
    )
)]
pub(crate) async fn add_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
    Json(dto): Json<CommentFormDto>,
) -> AppResult<Redirect> {
    COMMENT_FORM.check(&dto)?;
    state
        .comment_service
        .add_comment(auth.user_id, post_id, &dto.text)
        .await
        .map_err(|err| COMMENT_FORM.reject(&dto, err))?;

    Ok(urls::redirect_to(&RedirectTarget::PostDetail { post_id }))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit_comment/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    params(
        ("post_id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment form bound to the comment", body = FormView),
        (status = 303, description = "Not the author; redirect to the post"),
        (status = 404, description = "Comment not found on this post")
    )
)]
pub(crate) async fn edit_comment_form(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
) -> AppResult<Json<FormView>> {
    let comment = state
        .comment_service
        .get_comment_for_edit(auth.user_id, post_id, comment_id)
        .await?;
    Ok(Json(COMMENT_FORM.bound(&CommentFormDto { text: comment.text })))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit_comment/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    params(
        ("post_id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    request_body = CommentFormDto,
    responses(
        (status = 303, description = "Updated, or not the author; redirect to the post"),
        (status = 400, description = "Form with errors", body = FormView),
        (status = 404, description = "Comment not found on this post")
    )
)]
pub(crate) async fn edit_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
    payload: Result<Json<CommentFormDto>, JsonRejection>,
) -> AppResult<Redirect> {
    state
        .comment_service
        .get_comment_for_edit(auth.user_id, post_id, comment_id)
        .await?;
    let Json(dto) = payload?;
    COMMENT_FORM.check(&dto)?;
    state
        .comment_service
        .update_comment(auth.user_id, post_id, comment_id, &dto.text)
        .await
        .map_err(|err| COMMENT_FORM.reject(&dto, err))?;

    Ok(urls::redirect_to(&RedirectTarget::PostDetail { post_id }))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/delete_comment/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    params(
        ("post_id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "The comment to confirm deletion of", body = FormView),
        (status = 303, description = "Not the author; redirect to the post"),
        (status = 404, description = "Comment not found on this post")
    )
)]
pub(crate) async fn delete_comment_confirm(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
) -> AppResult<Json<FormView>> {
    let comment = state
        .comment_service
        .get_comment_for_edit(auth.user_id, post_id, comment_id)
        .await?;
    Ok(Json(COMMENT_FORM.bound(&CommentFormDto { text: comment.text })))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/delete_comment/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    params(
        ("post_id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 303, description = "Deleted, or not the author; redirect to the post"),
        (status = 404, description = "Comment not found on this post")
    )
)]
pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    IdPath((post_id, comment_id)): IdPath<(i64, i64)>,
) -> AppResult<Redirect> {
    state
        .comment_service
        .delete_comment(auth.user_id, post_id, comment_id)
        .await?;

    Ok(urls::redirect_to(&RedirectTarget::PostDetail { post_id }))
}
