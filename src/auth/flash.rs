use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use url::form_urlencoded;

use crate::auth::cookie_value;

pub const FLASH_COOKIE: &str = "sidequest_flash";

/// One-shot notice carried across a redirect in a short-lived cookie.
/// Pages that display it attach `clear_cookie()` so it shows once.
pub struct Flash(pub Option<String>);

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash(cookie_value(parts, FLASH_COOKIE).map(|raw| decode(&raw))))
    }
}

/// 303 redirect carrying a flash notice.
pub fn redirect_with_notice(to: &str, message: &str) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, to.to_string()),
            (header::SET_COOKIE, set_cookie(message)),
        ],
        "",
    )
        .into_response()
}

pub fn set_cookie(message: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("{}={}; Path=/; Max-Age=60", FLASH_COOKIE, encoded)
}

pub fn clear_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0", FLASH_COOKIE)
}

// The whole value is serialized as a single form key, so '=' and '&'
// never appear and the first parsed key is the message.
fn decode(raw: &str) -> String {
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default()
}
