pub(crate) mod category_repository;
pub(crate) mod comment_repository;
pub(crate) mod post_repository;
pub(crate) mod user_repository;

#[cfg(test)]
mod seed;

use crate::domain::error::DomainError;

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres error code and constraint name, when the error came from the server.
fn constraint_violation(err: &sqlx::Error) -> Option<(String, Option<String>)> {
    if let sqlx::Error::Database(db_err) = err {
        let code = db_err.code()?.into_owned();
        return Some((code, db_err.constraint().map(str::to_string)));
    }
    None
}

fn unexpected(err: sqlx::Error) -> DomainError {
    DomainError::Unexpected(err.to_string())
}
