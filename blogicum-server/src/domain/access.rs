//! Ownership checks for mutable content.
//!
//! Only the author of a post or comment may change it. A refused actor is not
//! shown an error: the entity decides where they are sent instead.

use super::error::DomainError;

/// A named place in the application a request can be redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RedirectTarget {
    Index,
    PostDetail { post_id: i64 },
    Profile { username: String },
    Login { next: Option<String> },
}

/// Kind of author-owned entity, carrying what its denial redirect needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntityKind {
    Post { post_id: i64 },
    Comment { post_id: i64 },
}

impl EntityKind {
    pub(crate) fn denial_redirect(self) -> RedirectTarget {
        match self {
            EntityKind::Post { post_id } => RedirectTarget::PostDetail { post_id },
            // comments live on their parent post's page
            EntityKind::Comment { post_id } => RedirectTarget::PostDetail { post_id },
        }
    }
}

pub(crate) trait Authored {
    fn author_id(&self) -> i64;
    fn kind(&self) -> EntityKind;
}

pub(crate) fn can_modify(actor_id: i64, entity: &impl Authored) -> bool {
    entity.author_id() == actor_id
}

pub(crate) fn ensure_can_modify(actor_id: i64, entity: &impl Authored) -> Result<(), DomainError> {
    if can_modify(actor_id, entity) {
        return Ok(());
    }
    tracing::debug!(actor_id, kind = ?entity.kind(), "modification denied");
    Err(DomainError::AccessDenied(entity.kind().denial_redirect()))
}
