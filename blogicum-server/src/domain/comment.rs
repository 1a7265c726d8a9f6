use chrono::{DateTime, Utc};

use super::access::{Authored, EntityKind};
use super::error::DomainError;
use super::post::AuthorRef;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) is_published: bool,
    pub(crate) post_id: i64,
    pub(crate) author_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.author_id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Comment {
            post_id: self.post_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommentView {
    pub(crate) comment: Comment,
    pub(crate) author: AuthorRef,
}

pub(crate) fn normalize_comment_text(text: &str) -> Result<String, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::Validation {
            field: "text",
            message: "This field is required.",
        });
    }
    Ok(text.to_string())
}
