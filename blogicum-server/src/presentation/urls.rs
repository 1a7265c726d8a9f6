//! Path reversal for redirect targets.

use axum::response::Redirect;
use url::form_urlencoded;

use crate::domain::access::RedirectTarget;

pub(crate) const INDEX: &str = "/";
pub(crate) const LOGIN: &str = "/auth/login";

pub(crate) fn post_detail(post_id: i64) -> String {
    format!("/posts/{post_id}")
}

/// Usernames are restricted to URL-safe ASCII on input.
pub(crate) fn profile(username: &str) -> String {
    format!("/profile/{username}")
}

pub(crate) fn login(next: Option<&str>) -> String {
    match next.and_then(local_path) {
        Some(next) => {
            let next: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
            format!("{LOGIN}?next={next}")
        }
        None => LOGIN.to_string(),
    }
}

pub(crate) fn reverse(target: &RedirectTarget) -> String {
    match target {
        RedirectTarget::Index => INDEX.to_string(),
        RedirectTarget::PostDetail { post_id } => post_detail(*post_id),
        RedirectTarget::Profile { username } => profile(username),
        RedirectTarget::Login { next } => login(next.as_deref()),
    }
}

/// `303 See Other` to the target.
pub(crate) fn redirect_to(target: &RedirectTarget) -> Redirect {
    Redirect::to(&reverse(target))
}

/// Accepts only same-origin paths, so `next` cannot bounce a user offsite.
pub(crate) fn local_path(next: &str) -> Option<&str> {
    let is_local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.starts_with("/\\")
        && next.is_ascii()
        && !next.chars().any(|ch| ch.is_ascii_control());
    is_local.then_some(next)
}
