use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{FOREIGN_KEY_VIOLATION, constraint_violation, unexpected};
use crate::data::post_repository::{NewPost, PostPatch, PostRepository, PostScope};
use crate::domain::category::{CategoryRef, LocationRef};
use crate::domain::error::DomainError;
use crate::domain::pagination::Pagination;
use crate::domain::post::{AuthorRef, Post, PostView};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, title, text, image, pub_date, is_published, author_id, \
                            category_id, location_id, created_at";

const POST_VIEW_SELECT: &str = r#"
    SELECT
        p.id,
        p.title,
        p.text,
        p.image,
        p.pub_date,
        p.is_published,
        p.author_id,
        p.category_id,
        p.location_id,
        p.created_at,
        u.username AS author_username,
        c.title AS category_title,
        c.slug AS category_slug,
        c.is_published AS category_is_published,
        l.name AS location_name,
        (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

#[derive(FromRow)]
struct PostRow {
    id: i64,
    title: String,
    text: String,
    image: Option<String>,
    pub_date: DateTime<Utc>,
    is_published: bool,
    author_id: i64,
    category_id: Option<i64>,
    location_id: Option<i64>,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct PostViewRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_username: String,
    category_title: Option<String>,
    category_slug: Option<String>,
    category_is_published: Option<bool>,
    location_name: Option<String>,
    comment_count: i64,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO posts (title, text, image, pub_date, author_id, category_id, location_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(input.title)
            .bind(input.text)
            .bind(input.image)
            .bind(input.pub_date)
            .bind(input.author_id)
            .bind(input.category_id)
            .bind(input.location_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(map_row_to_post(row))
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(row.map(map_row_to_post))
    }

    async fn get_post_view(&self, id: i64) -> Result<Option<PostView>, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new(POST_VIEW_SELECT);
        query.push(" WHERE p.id = ").push_bind(id);

        let row = query
            .build_query_as::<PostViewRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(row.map(map_row_to_post_view))
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let sql = format!(
            r#"
            UPDATE posts
            SET title = $3,
                text = $4,
                image = $5,
                pub_date = $6,
                category_id = $7,
                location_id = $8
            WHERE id = $1 AND author_id = $2
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .bind(owner_id)
            .bind(patch.title)
            .bind(patch.text)
            .bind(patch.image)
            .bind(patch.pub_date)
            .bind(patch.category_id)
            .bind(patch.location_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(row.map(map_row_to_post))
    }

    async fn delete_post_owned(&self, post_id: i64, owner_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(post_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(
        &self,
        scope: PostScope,
        now: DateTime<Utc>,
        pagination: Pagination,
    ) -> Result<Vec<PostView>, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new(POST_VIEW_SELECT);
        push_scope(&mut query, scope, now);
        query
            .push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<PostViewRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(rows.into_iter().map(map_row_to_post_view).collect())
    }

    async fn count_posts(&self, scope: PostScope, now: DateTime<Utc>) -> Result<i64, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM posts p LEFT JOIN categories c ON c.id = p.category_id",
        );
        push_scope(&mut query, scope, now);

        query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }
}

fn push_scope(query: &mut QueryBuilder<'_, Postgres>, scope: PostScope, now: DateTime<Utc>) {
    query.push(" WHERE TRUE");
    match scope {
        PostScope::Public => push_visibility_filter(query, now),
        PostScope::Category { category_id } => {
            query.push(" AND p.category_id = ").push_bind(category_id);
            push_visibility_filter(query, now);
        }
        PostScope::Author {
            author_id,
            include_hidden,
        } => {
            query.push(" AND p.author_id = ").push_bind(author_id);
            if !include_hidden {
                push_visibility_filter(query, now);
            }
        }
    }
}

/// SQL form of `PostView::is_publicly_visible`. Expects `posts p` and
/// `categories c` to be in scope.
fn push_visibility_filter(query: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
    query
        .push(" AND p.is_published AND (c.id IS NULL OR c.is_published) AND p.pub_date <= ")
        .push_bind(now);
}

fn map_row_to_post(row: PostRow) -> Post {
    Post {
        id: row.id,
        title: row.title,
        text: row.text,
        image: row.image,
        pub_date: row.pub_date,
        is_published: row.is_published,
        author_id: row.author_id,
        category_id: row.category_id,
        location_id: row.location_id,
        created_at: row.created_at,
    }
}

fn map_row_to_post_view(row: PostViewRow) -> PostView {
    let category = match (
        row.post.category_id,
        row.category_title,
        row.category_slug,
        row.category_is_published,
    ) {
        (Some(id), Some(title), Some(slug), Some(is_published)) => Some(CategoryRef {
            id,
            title,
            slug,
            is_published,
        }),
        _ => None,
    };
    let location = row
        .post
        .location_id
        .zip(row.location_name)
        .map(|(id, name)| LocationRef { id, name });
    let author = AuthorRef {
        id: row.post.author_id,
        username: row.author_username,
    };

    PostView {
        post: map_row_to_post(row.post),
        author,
        category,
        location,
        comment_count: row.comment_count,
    }
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let Some((code, constraint)) = constraint_violation(&err)
        && code == FOREIGN_KEY_VIOLATION
    {
        return match constraint.as_deref() {
            Some("posts_category_id_fkey") => DomainError::Validation {
                field: "category",
                message: "Select a valid choice. That choice is not one of the available choices.",
            },
            Some("posts_location_id_fkey") => DomainError::Validation {
                field: "location",
                message: "Select a valid choice. That choice is not one of the available choices.",
            },
            _ => DomainError::NotFound("author".to_string()),
        };
    }
    unexpected(err)
}
