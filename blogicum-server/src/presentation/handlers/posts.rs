use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::Redirect,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::blog_service::PostDetail;
use crate::domain::access::RedirectTarget;
use crate::domain::comment::CommentView;
use crate::domain::pagination::Page;
use crate::domain::post::{Post, PostDraft, PostView};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::forms::{COMMENT_FORM, FormView, POST_FORM};
use crate::presentation::handlers::IdPath;
use crate::presentation::middleware::auth::{AuthenticatedUser, Viewer};
use crate::presentation::urls;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub(crate) struct PostFormDto {
    #[validate(length(max = 256, message = "Ensure this value has at most 256 characters."))]
    pub(crate) title: String,
    pub(crate) text: String,
    /// Location id.
    pub(crate) location: Option<i64>,
    /// `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` or RFC 3339.
    pub(crate) pub_date: String,
    /// Category id.
    pub(crate) category: Option<i64>,
    /// Media path of the uploaded image.
    #[validate(length(max = 100, message = "Ensure the file name has at most 100 characters."))]
    pub(crate) image: Option<String>,
    /// Drop the current image on update.
    pub(crate) image_clear: bool,
}

impl PostFormDto {
    fn to_draft(&self) -> PostDraft {
        PostDraft {
            title: self.title.clone(),
            text: self.text.clone(),
            location_id: self.location,
            pub_date: self.pub_date.clone(),
            category_id: self.category,
            image: self.image.clone(),
            image_clear: self.image_clear,
        }
    }
}

impl From<&Post> for PostFormDto {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            location: post.location_id,
            pub_date: post.pub_date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            category: post.category_id,
            image: post.image.clone(),
            image_clear: false,
        }
    }
}

/// `page` is kept raw: anything that is not a page number falls back to the
/// first page.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct PageQuery {
    pub(crate) page: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AuthorDto {
    pub(crate) id: i64,
    pub(crate) username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CategoryRefDto {
    pub(crate) title: String,
    pub(crate) slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostSummaryDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) image: Option<String>,
    pub(crate) pub_date: DateTime<Utc>,
    pub(crate) is_published: bool,
    pub(crate) author: AuthorDto,
    pub(crate) category: Option<CategoryRefDto>,
    pub(crate) location: Option<String>,
    pub(crate) comment_count: i64,
}

impl From<PostView> for PostSummaryDto {
    fn from(view: PostView) -> Self {
        Self {
            id: view.post.id,
            title: view.post.title,
            text: view.post.text,
            image: view.post.image,
            pub_date: view.post.pub_date,
            is_published: view.post.is_published,
            author: AuthorDto {
                id: view.author.id,
                username: view.author.username,
            },
            category: view.category.map(|category| CategoryRefDto {
                title: category.title,
                slug: category.slug,
            }),
            location: view.location.map(|location| location.name),
            comment_count: view.comment_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PageInfoDto {
    pub(crate) number: u32,
    pub(crate) num_pages: u32,
    pub(crate) count: i64,
    pub(crate) has_next: bool,
    pub(crate) has_previous: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostPageDto {
    pub(crate) posts: Vec<PostSummaryDto>,
    pub(crate) page: PageInfoDto,
}

impl From<Page<PostView>> for PostPageDto {
    fn from(page: Page<PostView>) -> Self {
        let info = PageInfoDto {
            number: page.number,
            num_pages: page.num_pages,
            count: page.count,
            has_next: page.has_next(),
            has_previous: page.has_previous(),
        };
        Self {
            posts: page.items.into_iter().map(PostSummaryDto::from).collect(),
            page: info,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CategoryDto {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CategoryPageDto {
    pub(crate) category: CategoryDto,
    #[serde(flatten)]
    pub(crate) feed: PostPageDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) author: AuthorDto,
}

impl From<CommentView> for CommentDto {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            text: view.comment.text,
            created_at: view.comment.created_at,
            author: AuthorDto {
                id: view.author.id,
                username: view.author.username,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDetailDto {
    pub(crate) post: PostSummaryDto,
    /// Published comments, oldest first.
    pub(crate) comments: Vec<CommentDto>,
    pub(crate) comment_form: FormView,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "posts",
    params(PageQuery),
    responses(
        (status = 200, description = "Global feed page", body = PostPageDto),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PostPageDto>> {
    let page = state
        .blog_service
        .list_public_posts(query.page.as_deref())
        .await?;
    Ok(Json(PostPageDto::from(page)))
}

#[utoipa::path(
    get,
    path = "/category/{slug}",
    tag = "posts",
    params(
        ("slug" = String, Path, description = "Category slug"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Category feed page", body = CategoryPageDto),
        (status = 404, description = "Category missing or unpublished"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn category_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<CategoryPageDto>> {
    let feed = state
        .blog_service
        .list_category_posts(&slug, query.page.as_deref())
        .await?;
    Ok(Json(CategoryPageDto {
        category: CategoryDto {
            title: feed.category.title,
            description: feed.category.description,
            slug: feed.category.slug,
        },
        feed: PostPageDto::from(feed.page),
    }))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}",
    tag = "posts",
    params(("post_id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post with its comments", body = PostDetailDto),
        (status = 404, description = "Post missing or hidden from the viewer"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn post_detail(
    State(state): State<AppState>,
    viewer: Viewer,
    IdPath(post_id): IdPath<i64>,
) -> AppResult<Json<PostDetailDto>> {
    let PostDetail { post, comments } = state
        .blog_service
        .get_post_detail(post_id, viewer.user_id())
        .await?;

    Ok(Json(PostDetailDto {
        post: PostSummaryDto::from(post),
        comments: comments.into_iter().map(CommentDto::from).collect(),
        comment_form: COMMENT_FORM.unbound(),
    }))
}

#[utoipa::path(
    get,
    path = "/posts/create",
    tag = "posts",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    responses(
        (status = 200, description = "Empty post form", body = FormView),
        (status = 303, description = "Login required")
    )
)]
pub(crate) async fn create_post_form(_auth: AuthenticatedUser) -> Json<FormView> {
    Json(POST_FORM.unbound())
}

#[utoipa::path(
    post,
    path = "/posts/create",
    tag = "posts",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    request_body = PostFormDto,
    responses(
        (status = 303, description = "Created; redirect to the author's profile"),
        (status = 400, description = "Form with errors", body = FormView),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<PostFormDto>,
) -> AppResult<Redirect> {
    POST_FORM.check(&dto)?;
    state
        .blog_service
        .create_post(auth.user_id, dto.to_draft())
        .await
        .map_err(|err| POST_FORM.reject(&dto, err))?;

    let target = state.blog_service.author_profile(auth.user_id).await?;
    Ok(urls::redirect_to(&target))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit",
    tag = "posts",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    params(("post_id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post form bound to the post", body = FormView),
        (status = 303, description = "Not the author; redirect to the post"),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn edit_post_form(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
) -> AppResult<Json<FormView>> {
    let post = state
        .blog_service
        .get_post_for_edit(auth.user_id, post_id)
        .await?;
    Ok(Json(POST_FORM.bound(&PostFormDto::from(&post))))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit",
    tag = "posts",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    params(("post_id" = i64, Path, description = "Post id")),
    request_body = PostFormDto,
    responses(
        (status = 303, description = "Updated, or not the author; redirect to the post"),
        (status = 400, description = "Form with errors", body = FormView),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn edit_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
    payload: Result<Json<PostFormDto>, JsonRejection>,
) -> AppResult<Redirect> {
    state
        .blog_service
        .get_post_for_edit(auth.user_id, post_id)
        .await?;
    let Json(dto) = payload?;
    POST_FORM.check(&dto)?;
    state
        .blog_service
        .update_post(auth.user_id, post_id, dto.to_draft())
        .await
        .map_err(|err| POST_FORM.reject(&dto, err))?;

    Ok(urls::redirect_to(&RedirectTarget::PostDetail { post_id }))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}/delete",
    tag = "posts",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    params(("post_id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post to confirm deletion of", body = FormView),
        (status = 303, description = "Not the author; redirect to the post"),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn delete_post_confirm(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
) -> AppResult<Json<FormView>> {
    let post = state
        .blog_service
        .get_post_for_edit(auth.user_id, post_id)
        .await?;
    Ok(Json(POST_FORM.bound(&PostFormDto::from(&post))))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/delete",
    tag = "posts",
    security(("bearer_auth" = []), ("session_cookie" = [])),
    params(("post_id" = i64, Path, description = "Post id")),
    responses(
        (status = 303, description = "Deleted; redirect to the author's profile. Non-authors go to the post"),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    IdPath(post_id): IdPath<i64>,
) -> AppResult<Redirect> {
    state
        .blog_service
        .delete_post(auth.user_id, post_id)
        .await?;

    let target = state.blog_service.author_profile(auth.user_id).await?;
    Ok(urls::redirect_to(&target))
}
