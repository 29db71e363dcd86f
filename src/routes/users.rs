use askama::Template;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};

use crate::auth::flash::{self, Flash};
use crate::auth::handlers::clear_session_cookie;
use crate::content::{questions, reviews};
use crate::db::models::{Question, Review, User};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{DeleteAccountForm, FieldError, ProfileEditForm};
use crate::routes::home::page;
use crate::state::AppState;
use crate::users;

#[derive(Template)]
#[template(path = "users/profile.html")]
struct ProfileTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    user: User,
    reviews: Vec<Review>,
    questions: Vec<Question>,
    answered: Vec<Question>,
    viewer_is_self: bool,
}

#[derive(Template)]
#[template(path = "users/edit.html")]
struct EditTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    user: User,
    form: ProfileEditForm,
    errors: Vec<FieldError>,
}

#[derive(Template)]
#[template(path = "users/delete.html")]
struct DeleteTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    user: User,
    errors: Vec<FieldError>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{username}", get(profile))
        .route("/users/{username}/edit", get(edit_page).post(edit_submit))
        .route(
            "/users/{username}/delete",
            get(delete_page).post(delete_submit),
        )
}

/// GET /users/{username} — public profile: authored reviews and
/// questions newest-first, plus the questions this user has answered.
async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let user = users::find(&conn, &username)?.ok_or(AppError::NotFound)?;
    let reviews = reviews::list_for_user(&conn, &username)?;
    let question_list = questions::list_for_user(&conn, &username)?;
    let answered = questions::answered_by(&conn, &username)?;

    let viewer = viewer.map(|u| u.username);
    let viewer_is_self = viewer.as_deref() == Some(user.username.as_str());

    let had_notice = notice.is_some();
    Ok(page(
        ProfileTemplate {
            viewer,
            notice,
            user,
            reviews,
            questions: question_list,
            answered,
            viewer_is_self,
        },
        had_notice,
    ))
}

fn require_self(current: &CurrentUser, username: &str) -> AppResult<()> {
    if current.username != username {
        return Err(AppError::Forbidden("Access unauthorized".into()));
    }
    Ok(())
}

/// GET /users/{username}/edit — self only
async fn edit_page(
    State(state): State<AppState>,
    Path(username): Path<String>,
    current: CurrentUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    require_self(&current, &username)?;

    let conn = state.db.get()?;
    let user = users::find(&conn, &username)?.ok_or(AppError::NotFound)?;

    let form = ProfileEditForm {
        email: user.email.clone(),
        bio: user.bio.clone(),
        image_url: user.image_url.clone(),
        ..Default::default()
    };
    let had_notice = notice.is_some();
    Ok(page(
        EditTemplate {
            viewer: Some(current.username),
            notice,
            user,
            form,
            errors: Vec::new(),
        },
        had_notice,
    ))
}

/// POST /users/{username}/edit — re-authenticates with the current
/// password, then applies only the non-empty fields.
async fn edit_submit(
    State(state): State<AppState>,
    Path(username): Path<String>,
    current: CurrentUser,
    Form(form): Form<ProfileEditForm>,
) -> AppResult<Response> {
    require_self(&current, &username)?;

    let conn = state.db.get()?;
    let user = users::find(&conn, &username)?.ok_or(AppError::NotFound)?;

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(page(
            EditTemplate {
                viewer: Some(current.username),
                notice: None,
                user,
                form,
                errors,
            },
            false,
        ));
    }

    let updated = users::update_profile(&conn, &username, &form.password, &form.to_patch())?;
    if updated.is_none() {
        return Ok(flash::redirect_with_notice(
            &format!("/users/{}/edit", username),
            "Username and password do not match",
        ));
    }

    Ok(axum::response::Redirect::to(&format!("/users/{}", username)).into_response())
}

/// GET /users/{username}/delete — self only, asks for the password
async fn delete_page(
    State(state): State<AppState>,
    Path(username): Path<String>,
    current: CurrentUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    require_self(&current, &username)?;

    let conn = state.db.get()?;
    let user = users::find(&conn, &username)?.ok_or(AppError::NotFound)?;

    let had_notice = notice.is_some();
    Ok(page(
        DeleteTemplate {
            viewer: Some(current.username),
            notice,
            user,
            errors: Vec::new(),
        },
        had_notice,
    ))
}

/// POST /users/{username}/delete — password-confirmed account removal.
/// Content is orphaned, upvotes and sessions go with the account.
async fn delete_submit(
    State(state): State<AppState>,
    Path(username): Path<String>,
    current: CurrentUser,
    Form(form): Form<DeleteAccountForm>,
) -> AppResult<Response> {
    require_self(&current, &username)?;

    let conn = state.db.get()?;
    let user = users::find(&conn, &username)?.ok_or(AppError::NotFound)?;

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(page(
            DeleteTemplate {
                viewer: Some(current.username),
                notice: None,
                user,
                errors,
            },
            false,
        ));
    }

    if !users::delete_user(&conn, &username, &form.password)? {
        return Ok(flash::redirect_with_notice(
            &format!("/users/{}/delete", username),
            "Username and password do not match",
        ));
    }

    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, "/".to_string())],
        AppendHeaders([
            (header::SET_COOKIE, clear_session_cookie()),
            (header::SET_COOKIE, flash::set_cookie("Game Over")),
        ]),
        "",
    )
        .into_response())
}
