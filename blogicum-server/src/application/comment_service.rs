use chrono::Utc;
use tracing::info;

use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::post_repository::PostRepository;
use crate::domain::access::ensure_can_modify;
use crate::domain::comment::{Comment, normalize_comment_text};
use crate::domain::error::DomainError;

pub(crate) struct CommentService<M, P>
where
    M: CommentRepository,
    P: PostRepository,
{
    comments: M,
    posts: P,
}

impl<M, P> CommentService<M, P>
where
    M: CommentRepository,
    P: PostRepository,
{
    pub(crate) fn new(comments: M, posts: P) -> Self {
        Self { comments, posts }
    }

    /// Comments can only be left on posts the public can currently see, even by
    /// the post's author.
    pub(crate) async fn add_comment(
        &self,
        author_id: i64,
        post_id: i64,
        text: &str,
    ) -> Result<Comment, DomainError> {
        let text = normalize_comment_text(text)?;

        let now = Utc::now();
        self.posts
            .get_post_view(post_id)
            .await?
            .filter(|view| view.is_publicly_visible(now))
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        let comment = self
            .comments
            .create_comment(NewComment {
                text,
                post_id,
                author_id,
            })
            .await?;
        info!(comment_id = comment.id, post_id, author_id, "comment added");
        Ok(comment)
    }

    pub(crate) async fn get_comment_for_edit(
        &self,
        actor_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Comment, DomainError> {
        let comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;
        ensure_can_modify(actor_id, &comment)?;
        Ok(comment)
    }

    pub(crate) async fn update_comment(
        &self,
        actor_id: i64,
        post_id: i64,
        comment_id: i64,
        text: &str,
    ) -> Result<Comment, DomainError> {
        self.get_comment_for_edit(actor_id, post_id, comment_id)
            .await?;
        let text = normalize_comment_text(text)?;

        let comment = self
            .comments
            .update_comment_owned(comment_id, actor_id, text)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;
        info!(comment_id, post_id, actor_id, "comment updated");
        Ok(comment)
    }

    pub(crate) async fn delete_comment(
        &self,
        actor_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<(), DomainError> {
        self.get_comment_for_edit(actor_id, post_id, comment_id)
            .await?;

        if !self
            .comments
            .delete_comment_owned(comment_id, actor_id)
            .await?
        {
            return Err(DomainError::not_found("comment", comment_id));
        }
        info!(comment_id, post_id, actor_id, "comment deleted");
        Ok(())
    }
}
