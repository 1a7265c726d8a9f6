//! Raw inserts for repository tests run against a migrated database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub(super) async fn user(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (username, password_hash) VALUES ($1, 'x') RETURNING id")
        .bind(username)
        .fetch_one(pool)
        .await
        .expect("insert user")
}

pub(super) async fn category(pool: &PgPool, slug: &str, is_published: bool) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO categories (title, description, slug, is_published) \
         VALUES ($1, '', $1, $2) RETURNING id",
    )
    .bind(slug)
    .bind(is_published)
    .fetch_one(pool)
    .await
    .expect("insert category")
}

pub(super) async fn post(
    pool: &PgPool,
    author_id: i64,
    category_id: Option<i64>,
    is_published: bool,
    pub_date: DateTime<Utc>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO posts (title, text, pub_date, is_published, author_id, category_id) \
         VALUES ('t', 'body', $1, $2, $3, $4) RETURNING id",
    )
    .bind(pub_date)
    .bind(is_published)
    .bind(author_id)
    .bind(category_id)
    .fetch_one(pool)
    .await
    .expect("insert post")
}

pub(super) async fn comment(pool: &PgPool, post_id: i64, author_id: i64, is_published: bool) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO comments (text, is_published, post_id, author_id) \
         VALUES ('c', $1, $2, $3) RETURNING id",
    )
    .bind(is_published)
    .bind(post_id)
    .bind(author_id)
    .fetch_one(pool)
    .await
    .expect("insert comment")
}
