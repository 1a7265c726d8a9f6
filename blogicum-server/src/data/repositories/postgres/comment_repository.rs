use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{FOREIGN_KEY_VIOLATION, constraint_violation, unexpected};
use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;
use crate::domain::post::AuthorRef;

#[derive(Debug, Clone)]
pub(crate) struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: i64,
    text: String,
    is_published: bool,
    post_id: i64,
    author_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CommentViewRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    author_username: String,
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (text, post_id, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, text, is_published, post_id, author_id, created_at
            "#,
        )
        .bind(input.text)
        .bind(input.post_id)
        .bind(input.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_comment_db_error)?;

        Ok(map_row_to_comment(row))
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, text, is_published, post_id, author_id, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(row.map(map_row_to_comment))
    }

    async fn update_comment_owned(
        &self,
        comment_id: i64,
        owner_id: i64,
        text: String,
    ) -> Result<Option<Comment>, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            UPDATE comments
            SET text = $3
            WHERE id = $1 AND author_id = $2
            RETURNING id, text, is_published, post_id, author_id, created_at
            "#,
        )
        .bind(comment_id)
        .bind(owner_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(row.map(map_row_to_comment))
    }

    async fn delete_comment_owned(
        &self,
        comment_id: i64,
        owner_id: i64,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
            .bind(comment_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_published_comments(
        &self,
        post_id: i64,
    ) -> Result<Vec<CommentView>, DomainError> {
        let rows = sqlx::query_as::<_, CommentViewRow>(
            r#"
            SELECT
                cm.id,
                cm.text,
                cm.is_published,
                cm.post_id,
                cm.author_id,
                cm.created_at,
                u.username AS author_username
            FROM comments cm
            JOIN users u ON u.id = cm.author_id
            WHERE cm.post_id = $1 AND cm.is_published
            ORDER BY cm.created_at ASC, cm.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows
            .into_iter()
            .map(|row| CommentView {
                author: AuthorRef {
                    id: row.comment.author_id,
                    username: row.author_username,
                },
                comment: map_row_to_comment(row.comment),
            })
            .collect())
    }
}

fn map_row_to_comment(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        text: row.text,
        is_published: row.is_published,
        post_id: row.post_id,
        author_id: row.author_id,
        created_at: row.created_at,
    }
}

fn map_comment_db_error(err: sqlx::Error) -> DomainError {
    if let Some((code, constraint)) = constraint_violation(&err)
        && code == FOREIGN_KEY_VIOLATION
    {
        let resource = match constraint.as_deref() {
            Some("comments_post_id_fkey") => "post",
            _ => "author",
        };
        return DomainError::NotFound(resource.to_string());
    }
    unexpected(err)
}
