use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::access::{Authored, EntityKind};
use super::category::{CategoryRef, LocationRef};
use super::error::DomainError;

pub(crate) const TITLE_MAX_LEN: usize = 256;
pub(crate) const IMAGE_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) image: Option<String>,
    pub(crate) pub_date: DateTime<Utc>,
    pub(crate) is_published: bool,
    pub(crate) author_id: i64,
    pub(crate) category_id: Option<i64>,
    pub(crate) location_id: Option<i64>,
    pub(crate) created_at: DateTime<Utc>,
}

impl Authored for Post {
    fn author_id(&self) -> i64 {
        self.author_id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Post { post_id: self.id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthorRef {
    pub(crate) id: i64,
    pub(crate) username: String,
}

/// A post joined with its author, category and location, plus the number of
/// comments attached to it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PostView {
    pub(crate) post: Post,
    pub(crate) author: AuthorRef,
    pub(crate) category: Option<CategoryRef>,
    pub(crate) location: Option<LocationRef>,
    pub(crate) comment_count: i64,
}

impl PostView {
    /// The public visibility rule. The SQL listings apply the same predicate in
    /// `push_visibility_filter`.
    pub(crate) fn is_publicly_visible(&self, now: DateTime<Utc>) -> bool {
        self.post.is_published
            && self.category.as_ref().is_none_or(|category| category.is_published)
            && self.post.pub_date <= now
    }

    /// Authors see their own posts whatever their publication state.
    pub(crate) fn is_visible_to(&self, viewer_id: Option<i64>, now: DateTime<Utc>) -> bool {
        viewer_id == Some(self.post.author_id) || self.is_publicly_visible(now)
    }
}

/// Post fields as submitted through the post form.
#[derive(Debug, Clone)]
pub(crate) struct PostDraft {
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) location_id: Option<i64>,
    pub(crate) pub_date: String,
    pub(crate) category_id: Option<i64>,
    pub(crate) image: Option<String>,
    pub(crate) image_clear: bool,
}

/// A draft that passed field rules.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidPostDraft {
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) location_id: Option<i64>,
    pub(crate) pub_date: DateTime<Utc>,
    pub(crate) category_id: i64,
    pub(crate) image: ImageChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ImageChange {
    Keep,
    Clear,
    Set(String),
}

impl ImageChange {
    pub(crate) fn apply(&self, current: Option<String>) -> Option<String> {
        match self {
            ImageChange::Keep => current,
            ImageChange::Clear => None,
            ImageChange::Set(path) => Some(path.clone()),
        }
    }
}

impl PostDraft {
    pub(crate) fn validate(self) -> Result<ValidPostDraft, DomainError> {
        let title = normalize_title(&self.title)?;
        let text = normalize_text(&self.text)?;
        let pub_date = parse_pub_date(&self.pub_date)?;
        let category_id = self.category_id.ok_or(DomainError::Validation {
            field: "category",
            message: "This field is required.",
        })?;

        let image = match self.image.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => {
                if path.chars().count() > IMAGE_MAX_LEN {
                    return Err(DomainError::Validation {
                        field: "image",
                        message: "Ensure the file name has at most 100 characters.",
                    });
                }
                ImageChange::Set(path.to_string())
            }
            _ if self.image_clear => ImageChange::Clear,
            _ => ImageChange::Keep,
        };

        Ok(ValidPostDraft {
            title,
            text,
            location_id: self.location_id,
            pub_date,
            category_id,
            image,
        })
    }
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::Validation {
            field: "title",
            message: "This field is required.",
        });
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(DomainError::Validation {
            field: "title",
            message: "Ensure this value has at most 256 characters.",
        });
    }
    Ok(title.to_string())
}

fn normalize_text(text: &str) -> Result<String, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::Validation {
            field: "text",
            message: "This field is required.",
        });
    }
    Ok(text.to_string())
}

/// Accepts the date input's `YYYY-MM-DD` (midnight UTC) as well as full
/// date-times.
pub(crate) fn parse_pub_date(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DomainError::Validation {
            field: "pub_date",
            message: "This field is required.",
        });
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.with_timezone(&Utc));
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|datetime| datetime.and_utc())
        .ok_or(DomainError::Validation {
            field: "pub_date",
            message: "Enter a valid date/time.",
        })
}
