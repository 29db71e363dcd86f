use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;

use crate::auth::flash::{self, Flash};
use crate::auth::{cookie_value, session, SESSION_COOKIE};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::forms::{FieldError, LoginForm, RegisterForm};
use crate::routes::home::page;
use crate::state::AppState;
use crate::users::{self, NewUser};

// -- Templates --

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub viewer: Option<String>,
    pub notice: Option<String>,
    pub form: RegisterForm,
    pub errors: Vec<FieldError>,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<String>,
    pub notice: Option<String>,
    pub form: LoginForm,
    pub errors: Vec<FieldError>,
}

// -- Cookie helpers --

pub fn session_cookie(token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}

// -- Register --

/// GET /register — already logged-in users go home
pub async fn register_page(MaybeUser(viewer): MaybeUser, Flash(notice): Flash) -> Response {
    if viewer.is_some() {
        return Redirect::to("/").into_response();
    }
    let had_notice = notice.is_some();
    page(
        RegisterTemplate {
            viewer: None,
            notice,
            form: RegisterForm::default(),
            errors: Vec::new(),
        },
        had_notice,
    )
}

/// POST /register — create the account and log it in
pub async fn register_submit(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if viewer.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(page(
            RegisterTemplate {
                viewer: None,
                notice: None,
                form,
                errors,
            },
            false,
        ));
    }

    let conn = state.db.get()?;
    let signup = users::signup(
        &conn,
        &NewUser {
            username: form.username.trim(),
            password: &form.password,
            email: form.email.trim(),
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
        },
    );
    let user = match signup {
        Ok(user) => user,
        Err(AppError::Conflict(message)) => {
            return Ok(page(
                RegisterTemplate {
                    viewer: None,
                    notice: None,
                    form,
                    errors: vec![FieldError {
                        field: "username",
                        message,
                    }],
                },
                false,
            ));
        }
        Err(e) => return Err(e),
    };

    let token = session::create_session(&conn, &user.username, state.config.auth.session_hours)?;

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (
                header::SET_COOKIE,
                session_cookie(&token, state.config.auth.session_hours),
            ),
        ],
        "",
    )
        .into_response())
}

// -- Login --

/// GET /login
pub async fn login_page(MaybeUser(viewer): MaybeUser, Flash(notice): Flash) -> Response {
    if viewer.is_some() {
        return Redirect::to("/").into_response();
    }
    let had_notice = notice.is_some();
    page(
        LoginTemplate {
            viewer: None,
            notice,
            form: LoginForm::default(),
            errors: Vec::new(),
        },
        had_notice,
    )
}

/// POST /login — verify credentials; bad ones re-render the form
pub async fn login_submit(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if viewer.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(page(
            LoginTemplate {
                viewer: None,
                notice: None,
                form,
                errors,
            },
            false,
        ));
    }

    let conn = state.db.get()?;
    let Some(user) = users::authenticate(&conn, form.username.trim(), &form.password)? else {
        return Ok(page(
            LoginTemplate {
                viewer: None,
                notice: None,
                form,
                errors: vec![FieldError {
                    field: "username",
                    message: "Invalid credentials.".into(),
                }],
            },
            false,
        ));
    };

    let token = session::create_session(&conn, &user.username, state.config.auth.session_hours)?;

    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, "/".to_string())],
        AppendHeaders([
            (
                header::SET_COOKIE,
                session_cookie(&token, state.config.auth.session_hours),
            ),
            (
                header::SET_COOKIE,
                flash::set_cookie(&format!("Hello, {}!", user.username)),
            ),
        ]),
        "",
    )
        .into_response())
}

// -- Logout --

/// POST /logout — session required; delete it and head to the login page
pub async fn logout(
    State(state): State<AppState>,
    _user: crate::extractors::CurrentUser,
    request: axum::http::Request<axum::body::Body>,
) -> AppResult<Response> {
    let (parts, _body) = request.into_parts();

    if let Some(token) = cookie_value(&parts, SESSION_COOKIE) {
        let conn = state.db.get()?;
        let _ = session::delete_session(&conn, &token);
    }

    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, "/login".to_string())],
        AppendHeaders([
            (header::SET_COOKIE, clear_session_cookie()),
            (header::SET_COOKIE, flash::set_cookie("Happy gaming!")),
        ]),
        "",
    )
        .into_response())
}
