use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::presentation::AppState;
use crate::presentation::handlers::comments::{
    add_comment, delete_comment, delete_comment_confirm, edit_comment, edit_comment_form,
};
use crate::presentation::handlers::posts::{
    category_posts, create_post, create_post_form, delete_post, delete_post_confirm, edit_post,
    edit_post_form, index, post_detail,
};
use crate::presentation::handlers::profile::{edit_profile, edit_profile_form, profile};
use crate::presentation::middleware::auth::login_required;

pub(crate) fn router() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(index))
        .route("/category/{slug}", get(category_posts))
        .route("/posts/{post_id}", get(post_detail))
        .route("/profile/{username}", get(profile));

    let protected = Router::new()
        .route("/edit_profile", get(edit_profile_form).post(edit_profile))
        .route("/posts/create", get(create_post_form).post(create_post))
        .route("/posts/{post_id}/edit", get(edit_post_form).post(edit_post))
        .route(
            "/posts/{post_id}/delete",
            get(delete_post_confirm).post(delete_post),
        )
        .route("/posts/{post_id}/comment", post(add_comment))
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}",
            get(edit_comment_form).post(edit_comment),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}",
            get(delete_comment_confirm).post(delete_comment),
        )
        .route_layer(middleware::from_fn(login_required));

    public.merge(protected)
}
