use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::auth::flash::{self, Flash};
use crate::content::{questions, reviews};
use crate::db::models::{Question, Review};
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::state::AppState;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Render a page, clearing the flash cookie when a notice was consumed.
pub fn page<T: Template>(template: T, had_notice: bool) -> Response {
    if had_notice {
        (
            [(header::SET_COOKIE, flash::clear_cookie())],
            Html(template),
        )
            .into_response()
    } else {
        Html(template).into_response()
    }
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub viewer: Option<String>,
    pub notice: Option<String>,
    pub reviews: Vec<Review>,
    pub questions: Vec<Question>,
}

/// Homepage: the five most recent reviews and questions site-wide.
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let (reviews, questions) = {
        let conn = state.db.get()?;
        (reviews::recent(&conn, 5)?, questions::recent(&conn, 5)?)
    };

    let had_notice = notice.is_some();
    Ok(page(
        HomeTemplate {
            viewer: viewer.map(|u| u.username),
            notice,
            reviews,
            questions,
        },
        had_notice,
    ))
}
