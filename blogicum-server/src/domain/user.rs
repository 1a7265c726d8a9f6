use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::DomainError;

pub(crate) const USERNAME_MAX_LEN: usize = 150;
pub(crate) const NAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) username: String,
    pub(crate) password1: String,
    pub(crate) password2: String,
}

impl RegisterRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = normalize_username(&self.username)?;
        if self.password1 != self.password2 {
            return Err(DomainError::Validation {
                field: "password2",
                message: "The two password fields didn't match.",
            });
        }
        validate_password(&self.password2, &username)?;
        Ok(Self {
            username,
            password1: self.password1,
            password2: self.password2,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl LoginRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(DomainError::Validation {
                field: "username",
                message: "This field is required.",
            });
        }

        if self.password.is_empty() {
            return Err(DomainError::Validation {
                field: "password",
                message: "This field is required.",
            });
        }
        Ok(Self {
            username: username.to_string(),
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProfileUpdateRequest {
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) username: String,
}

impl ProfileUpdateRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            email: normalize_email(&self.email)?,
            first_name: normalize_name("first_name", &self.first_name)?,
            last_name: normalize_name("last_name", &self.last_name)?,
            username: normalize_username(&self.username)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn new(
        id: i64,
        username: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::Validation {
                field: "id",
                message: "must be > 0",
            });
        }

        Ok(Self {
            id,
            username: normalize_username(&username.into())?,
            email: normalize_email(&email.into())?,
            first_name: first_name.into(),
            last_name: last_name.into(),
            created_at,
        })
    }
}

fn normalize_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::Validation {
            field: "username",
            message: "This field is required.",
        });
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(DomainError::Validation {
            field: "username",
            message: "Ensure this value has at most 150 characters.",
        });
    }
    // usernames end up in profile URLs, keep them ASCII
    let allowed = |ch: char| ch.is_ascii_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(DomainError::Validation {
            field: "username",
            message: "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        });
    }
    Ok(username.to_string())
}

/// Email is optional; an empty value is kept empty. Only the domain part is
/// lowercased.
fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim();
    let email = match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    };
    if !email.is_empty() && !email.validate_email() {
        return Err(DomainError::Validation {
            field: "email",
            message: "Enter a valid email address.",
        });
    }
    Ok(email)
}

fn normalize_name(field: &'static str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation {
            field,
            message: "Ensure this value has at most 150 characters.",
        });
    }
    Ok(value.to_string())
}

fn validate_password(password: &str, username: &str) -> Result<(), DomainError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(DomainError::Validation {
            field: "password2",
            message: "This password is too short. It must contain at least 8 characters.",
        });
    }
    if password.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(DomainError::Validation {
            field: "password2",
            message: "This password is entirely numeric.",
        });
    }
    if username.chars().count() >= 3
        && password.to_lowercase().contains(&username.to_lowercase())
    {
        return Err(DomainError::Validation {
            field: "password2",
            message: "The password is too similar to the username.",
        });
    }
    Ok(())
}
