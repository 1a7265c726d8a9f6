use sqlx::PgPool;
use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::blog_service::BlogService;
use crate::application::comment_service::CommentService;
use crate::data::repositories::postgres::category_repository::PostgresCategoryRepository;
use crate::data::repositories::postgres::comment_repository::PostgresCommentRepository;
use crate::data::repositories::postgres::post_repository::PostgresPostRepository;
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
use crate::infrastructure::jwt::JwtService;

pub(crate) mod app_error;
pub(crate) mod forms;
pub(crate) mod handlers;
pub(crate) mod http_handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;
pub(crate) mod urls;

pub(crate) type PgBlogService = BlogService<
    PostgresPostRepository,
    PostgresCommentRepository,
    PostgresCategoryRepository,
    PostgresUserRepository,
>;
pub(crate) type PgCommentService = CommentService<PostgresCommentRepository, PostgresPostRepository>;
pub(crate) type PgAuthService = AuthService<PostgresUserRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<PgAuthService>,
    pub(crate) blog_service: Arc<PgBlogService>,
    pub(crate) comment_service: Arc<PgCommentService>,
}

impl AppState {
    pub(crate) fn new(pool: PgPool, jwt: JwtService) -> Self {
        let posts = PostgresPostRepository::new(pool.clone());
        let comments = PostgresCommentRepository::new(pool.clone());
        let categories = PostgresCategoryRepository::new(pool.clone());
        let users = PostgresUserRepository::new(pool);

        Self {
            auth_service: Arc::new(AuthService::new(users.clone(), jwt)),
            blog_service: Arc::new(BlogService::new(
                posts.clone(),
                comments.clone(),
                categories,
                users,
            )),
            comment_service: Arc::new(CommentService::new(comments, posts)),
        }
    }
}
