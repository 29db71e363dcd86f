use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::flash;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Login required")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Catalog unavailable: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            // Auth failures surface as a redirect plus a one-shot notice,
            // never as a bare error page.
            AppError::Unauthenticated => {
                flash::redirect_with_notice("/login", "You must be logged in to do that")
            }
            AppError::Forbidden(msg) => flash::redirect_with_notice("/", &msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Upstream(msg) => {
                tracing::error!("Catalog error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Game catalog unavailable").into_response()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::Hash(e) => {
                tracing::error!("Hash error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn response(err: AppError) -> Response {
        err.into_response()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(response(AppError::NotFound).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        let resp = response(AppError::Unauthenticated);
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
        assert!(resp.headers().get(header::SET_COOKIE).is_some());
    }

    #[test]
    fn forbidden_redirects_home_with_notice() {
        let resp = response(AppError::Forbidden("Not yours".into()));
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[test]
    fn conflict_returns_409() {
        assert_eq!(
            response(AppError::Conflict("taken".into())).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn upstream_returns_502() {
        assert_eq!(
            response(AppError::Upstream("timeout".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn bad_request_returns_400() {
        assert_eq!(
            response(AppError::BadRequest("oops".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
