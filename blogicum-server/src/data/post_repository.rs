use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::pagination::Pagination;
use crate::domain::post::{Post, PostView};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) image: Option<String>,
    pub(crate) pub_date: DateTime<Utc>,
    pub(crate) author_id: i64,
    pub(crate) category_id: i64,
    pub(crate) location_id: Option<i64>,
}

/// Full replacement of the form-editable columns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PostPatch {
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) image: Option<String>,
    pub(crate) pub_date: DateTime<Utc>,
    pub(crate) category_id: i64,
    pub(crate) location_id: Option<i64>,
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostScope {
    /// Everything the public may see.
    Public,
    /// Public posts of one category.
    Category { category_id: i64 },
    /// Posts of one author; hidden ones only when the author is looking.
    Author {
        author_id: i64,
        include_hidden: bool,
    },
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn get_post_view(&self, id: i64) -> Result<Option<PostView>, DomainError>;
    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError>;
    async fn delete_post_owned(&self, post_id: i64, owner_id: i64) -> Result<bool, DomainError>;
    /// Posts in scope, newest `pub_date` first, with comment counts.
    async fn list_posts(
        &self,
        scope: PostScope,
        now: DateTime<Utc>,
        pagination: Pagination,
    ) -> Result<Vec<PostView>, DomainError>;
    async fn count_posts(&self, scope: PostScope, now: DateTime<Utc>) -> Result<i64, DomainError>;
}
