pub(crate) mod category_repository;
pub(crate) mod comment_repository;
#[cfg(test)]
pub(crate) mod memory;
pub(crate) mod post_repository;
pub(crate) mod repositories;
pub(crate) mod user_repository;
