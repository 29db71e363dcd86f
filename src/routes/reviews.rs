use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::auth::flash::{self, Flash};
use crate::catalog;
use crate::content::reviews;
use crate::db::models::{Game, Review};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{FieldError, ReviewForm};
use crate::routes::home::page;
use crate::state::AppState;
use crate::votes;

#[derive(Template)]
#[template(path = "games/reviews.html")]
struct GameReviewsTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    average: Option<f64>,
    reviews: Vec<Review>,
}

#[derive(Template)]
#[template(path = "games/add_review.html")]
struct AddReviewTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    form: ReviewForm,
    errors: Vec<FieldError>,
}

#[derive(Template)]
#[template(path = "games/review.html")]
struct ReviewTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    review: Review,
    upvoters: Vec<String>,
    viewer_has_upvoted: bool,
    viewer_is_author: bool,
}

#[derive(Template)]
#[template(path = "games/edit_review.html")]
struct EditReviewTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    review: Review,
    form: ReviewForm,
    errors: Vec<FieldError>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/games/{id}/reviews", get(list_for_game))
        .route("/games/{id}/review", get(add_page).post(add_submit))
        .route("/reviews/{id}", get(show))
        .route("/reviews/{id}/edit", get(edit_page).post(edit_submit))
        .route("/reviews/{id}/delete", delete(remove))
        .route("/reviews/{id}/upvote", post(upvote))
        .route("/reviews/{id}/remove_upvote", delete(remove_upvote))
}

/// GET /games/{id}/reviews — newest first, with the running average
async fn list_for_game(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let game = catalog::get_or_fetch(&state.db, &state.catalog, game_id).await?;

    let conn = state.db.get()?;
    let review_list = reviews::list_for_game(&conn, game_id)?;
    let average = reviews::average_rating(&conn, game_id)?;

    let had_notice = notice.is_some();
    Ok(page(
        GameReviewsTemplate {
            viewer: viewer.map(|u| u.username),
            notice,
            game,
            average,
            reviews: review_list,
        },
        had_notice,
    ))
}

/// GET /games/{id}/review — write-a-review form, session required
async fn add_page(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let Some(current) = viewer else {
        return Ok(flash::redirect_with_notice(
            &format!("/games/{}/reviews", game_id),
            "You must be logged in to write a review",
        ));
    };

    let game = catalog::get_or_fetch(&state.db, &state.catalog, game_id).await?;

    let had_notice = notice.is_some();
    Ok(page(
        AddReviewTemplate {
            viewer: Some(current.username),
            notice,
            game,
            form: ReviewForm::default(),
            errors: Vec::new(),
        },
        had_notice,
    ))
}

/// POST /games/{id}/review
async fn add_submit(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    axum::Form(form): axum::Form<ReviewForm>,
) -> AppResult<Response> {
    let Some(current) = viewer else {
        return Ok(flash::redirect_with_notice(
            &format!("/games/{}/reviews", game_id),
            "You must be logged in to write a review",
        ));
    };

    let game = catalog::get_or_fetch(&state.db, &state.catalog, game_id).await?;

    let (title, rating, text) = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(page(
                AddReviewTemplate {
                    viewer: Some(current.username),
                    notice: None,
                    game,
                    form,
                    errors,
                },
                false,
            ));
        }
    };

    {
        let conn = state.db.get()?;
        reviews::create_review(
            &conn,
            &current.username,
            game_id,
            &reviews::NewReview {
                title: &title,
                rating,
                text: &text,
            },
        )?;
    }

    Ok(flash::redirect_with_notice(
        &format!("/games/{}/reviews", game_id),
        &format!("Thanks for reviewing {}", game.name),
    ))
}

/// GET /reviews/{id} — detail page with the list of upvoters
async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let review = reviews::find_review(&conn, id)?.ok_or(AppError::NotFound)?;
    let game = catalog::find_game(&conn, review.game_id)?.ok_or(AppError::NotFound)?;
    let upvoters = votes::review_upvoters(&conn, id)?;

    let viewer = viewer.map(|u| u.username);
    let viewer_has_upvoted = match &viewer {
        Some(name) => upvoters.iter().any(|u| u == name),
        None => false,
    };
    let viewer_is_author = viewer.is_some() && viewer == review.username;

    let had_notice = notice.is_some();
    Ok(page(
        ReviewTemplate {
            viewer,
            notice,
            game,
            review,
            upvoters,
            viewer_has_upvoted,
            viewer_is_author,
        },
        had_notice,
    ))
}

/// GET /reviews/{id}/edit — author only, form prefilled
async fn edit_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let review = reviews::find_review(&conn, id)?.ok_or(AppError::NotFound)?;
    if review.username.as_deref() != Some(current.username.as_str()) {
        return Err(AppError::Forbidden(
            "Only a review's author can edit a review".into(),
        ));
    }
    let game = catalog::find_game(&conn, review.game_id)?.ok_or(AppError::NotFound)?;

    let form = ReviewForm {
        title: review.title.clone(),
        rating: review.rating.to_string(),
        text: review.text.clone(),
    };
    let had_notice = notice.is_some();
    Ok(page(
        EditReviewTemplate {
            viewer: Some(current.username),
            notice,
            game,
            review,
            form,
            errors: Vec::new(),
        },
        had_notice,
    ))
}

/// POST /reviews/{id}/edit
async fn edit_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
    axum::Form(form): axum::Form<ReviewForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;

    let patch = match form.to_patch() {
        Ok(patch) => patch,
        Err(errors) => {
            let review = reviews::find_review(&conn, id)?.ok_or(AppError::NotFound)?;
            let game = catalog::find_game(&conn, review.game_id)?.ok_or(AppError::NotFound)?;
            return Ok(page(
                EditReviewTemplate {
                    viewer: Some(current.username),
                    notice: None,
                    game,
                    review,
                    form,
                    errors,
                },
                false,
            ));
        }
    };

    let review = reviews::update_review(&conn, &current.username, id, &patch)?;
    Ok(Redirect::to(&format!("/reviews/{}", review.id)).into_response())
}

/// DELETE /reviews/{id}/delete — author only, answers with the game id
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let game_id = reviews::delete_review(&conn, &current.username, id)?;
    Ok(Json(serde_json::json!({ "game_id": game_id })).into_response())
}

/// POST /reviews/{id}/upvote — no self-upvotes; duplicates are allowed
/// unless dedupe is configured
async fn upvote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let upvote = votes::upvote_review(&conn, &current.username, id, state.config.votes.dedupe)?;
    Ok(Json(serde_json::json!({
        "review": upvote.review_id,
        "username": upvote.username,
    }))
    .into_response())
}

/// DELETE /reviews/{id}/remove_upvote — clears every matching row
async fn remove_upvote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    votes::remove_review_upvotes(&conn, &current.username, id)?;
    Ok(Json(serde_json::json!({ "review": id })).into_response())
}
