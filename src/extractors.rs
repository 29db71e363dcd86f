use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rusqlite::params;

use crate::auth::{cookie_value, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::AppState;

/// The acting identity for a request, resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub username: String,
}

/// Extractor that requires authentication. Rejects with a login redirect
/// when no valid, unexpired session is found.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(parts, SESSION_COOKIE).ok_or(AppError::Unauthenticated)?;

        let conn = state.db.get()?;
        conn.query_row(
            "SELECT u.username FROM sessions s \
             JOIN users u ON u.username = s.username \
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| {
                Ok(CurrentUser {
                    username: row.get(0)?,
                })
            },
        )
        .map_err(|_| AppError::Unauthenticated)
    }
}

/// Optional variant — anonymous requests get `None` instead of a redirect.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(_) => Ok(MaybeUser(None)),
        }
    }
}
