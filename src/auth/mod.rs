pub mod flash;
pub mod handlers;
pub mod session;

use axum::http::header;
use axum::http::request::Parts;

pub const SESSION_COOKIE: &str = "sidequest_session";

/// Pull a cookie value out of request headers by name.
pub(crate) fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val.to_string())
            } else {
                None
            }
        })
}
