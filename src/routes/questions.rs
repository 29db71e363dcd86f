use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::auth::flash::{self, Flash};
use crate::catalog;
use crate::content::{answers, questions};
use crate::db::models::{Answer, Game, Question};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{FieldError, QuestionForm};
use crate::routes::home::page;
use crate::state::AppState;
use crate::votes;

#[derive(Template)]
#[template(path = "games/questions.html")]
struct GameQuestionsTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    questions: Vec<Question>,
}

#[derive(Template)]
#[template(path = "games/add_question.html")]
struct AddQuestionTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    form: QuestionForm,
    errors: Vec<FieldError>,
}

/// One answer in the thread plus what the viewer needs to vote on it.
struct AnswerView {
    answer: Answer,
    upvotes: i64,
    viewer_upvoted: bool,
    viewer_is_author: bool,
}

#[derive(Template)]
#[template(path = "games/question.html")]
struct QuestionTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    question: Question,
    answers: Vec<AnswerView>,
    viewer_is_author: bool,
}

#[derive(Template)]
#[template(path = "games/edit_question.html")]
struct EditQuestionTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    question: Question,
    form: QuestionForm,
    errors: Vec<FieldError>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/games/{id}/questions", get(list_for_game))
        .route("/games/{id}/question", get(add_page).post(add_submit))
        .route("/questions/{id}", get(show))
        .route("/questions/{id}/edit", get(edit_page).post(edit_submit))
        .route("/questions/{id}/delete", delete(remove))
}

/// GET /games/{id}/questions — newest first
async fn list_for_game(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let game = catalog::get_or_fetch(&state.db, &state.catalog, game_id).await?;

    let conn = state.db.get()?;
    let question_list = questions::list_for_game(&conn, game_id)?;

    let had_notice = notice.is_some();
    Ok(page(
        GameQuestionsTemplate {
            viewer: viewer.map(|u| u.username),
            notice,
            game,
            questions: question_list,
        },
        had_notice,
    ))
}

/// GET /games/{id}/question — ask-a-question form, session required
async fn add_page(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let Some(current) = viewer else {
        return Ok(flash::redirect_with_notice(
            &format!("/games/{}/questions", game_id),
            "You must be logged in to ask a question",
        ));
    };

    let game = catalog::get_or_fetch(&state.db, &state.catalog, game_id).await?;

    let had_notice = notice.is_some();
    Ok(page(
        AddQuestionTemplate {
            viewer: Some(current.username),
            notice,
            game,
            form: QuestionForm::default(),
            errors: Vec::new(),
        },
        had_notice,
    ))
}

/// POST /games/{id}/question
async fn add_submit(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    axum::Form(form): axum::Form<QuestionForm>,
) -> AppResult<Response> {
    let Some(current) = viewer else {
        return Ok(flash::redirect_with_notice(
            &format!("/games/{}/questions", game_id),
            "You must be logged in to ask a question",
        ));
    };

    let game = catalog::get_or_fetch(&state.db, &state.catalog, game_id).await?;

    let (title, text) = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(page(
                AddQuestionTemplate {
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
        questions::create_question(
            &conn,
            &current.username,
            game_id,
            &questions::NewQuestion {
                title: &title,
                text: &text,
            },
        )?;
    }

    Ok(flash::redirect_with_notice(
        &format!("/games/{}/questions", game_id),
        "Thanks for your question. Hopefully it will soon be answered.",
    ))
}

/// GET /questions/{id} — the thread, oldest answer first, with the
/// viewer's own upvote state per answer
async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let question = questions::find_question(&conn, id)?.ok_or(AppError::NotFound)?;
    let game = catalog::find_game(&conn, question.game_id)?.ok_or(AppError::NotFound)?;

    let viewer = viewer.map(|u| u.username);
    let upvoted_ids = match &viewer {
        Some(name) => votes::upvoted_answer_ids(&conn, name)?,
        None => Vec::new(),
    };

    let mut answer_views = Vec::new();
    for answer in answers::list_for_question(&conn, id)? {
        let upvotes = votes::answer_upvote_count(&conn, answer.id)?;
        let viewer_upvoted = upvoted_ids.contains(&answer.id);
        let viewer_is_author = viewer.is_some() && viewer == answer.username;
        answer_views.push(AnswerView {
            answer,
            upvotes,
            viewer_upvoted,
            viewer_is_author,
        });
    }
    let viewer_is_author = viewer.is_some() && viewer == question.username;

    let had_notice = notice.is_some();
    Ok(page(
        QuestionTemplate {
            viewer,
            notice,
            game,
            question,
            answers: answer_views,
            viewer_is_author,
        },
        had_notice,
    ))
}

/// GET /questions/{id}/edit — author only
async fn edit_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let question = questions::find_question(&conn, id)?.ok_or(AppError::NotFound)?;
    if question.username.as_deref() != Some(current.username.as_str()) {
        return Err(AppError::Forbidden(
            "Only a question's author can edit a question".into(),
        ));
    }
    let game = catalog::find_game(&conn, question.game_id)?.ok_or(AppError::NotFound)?;

    let form = QuestionForm {
        title: question.title.clone(),
        text: question.text.clone(),
    };
    let had_notice = notice.is_some();
    Ok(page(
        EditQuestionTemplate {
            viewer: Some(current.username),
            notice,
            game,
            question,
            form,
            errors: Vec::new(),
        },
        had_notice,
    ))
}

/// POST /questions/{id}/edit
async fn edit_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
    axum::Form(form): axum::Form<QuestionForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;

    let patch = match form.to_patch() {
        Ok(patch) => patch,
        Err(errors) => {
            let question = questions::find_question(&conn, id)?.ok_or(AppError::NotFound)?;
            let game = catalog::find_game(&conn, question.game_id)?.ok_or(AppError::NotFound)?;
            return Ok(page(
                EditQuestionTemplate {
                    viewer: Some(current.username),
                    notice: None,
                    game,
                    question,
                    form,
                    errors,
                },
                false,
            ));
        }
    };

    let question = questions::update_question(&conn, &current.username, id, &patch)?;
    Ok(Redirect::to(&format!("/questions/{}", question.id)).into_response())
}

/// DELETE /questions/{id}/delete — author only; cascades the thread
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let game_id = questions::delete_question(&conn, &current.username, id)?;
    Ok(Json(serde_json::json!({ "game_id": game_id })).into_response())
}
