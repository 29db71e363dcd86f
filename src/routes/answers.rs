use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::content::answers;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::votes;

#[derive(Deserialize)]
pub struct AnswerPayload {
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/questions/{id}/answer", post(create))
        .route("/answers/{id}/edit", patch(edit))
        .route("/answers/{id}/delete", delete(remove))
        .route("/answers/{id}/upvote", post(upvote))
        .route("/answers/{id}/remove_upvote", delete(remove_upvote))
}

/// POST /questions/{id}/answer — session required, parent must exist
async fn create(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
    current: CurrentUser,
    Json(payload): Json<AnswerPayload>,
) -> AppResult<Response> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Answer text is required".into()));
    }

    let conn = state.db.get()?;
    let answer = answers::create_answer(&conn, &current.username, question_id, text)?;

    Ok(Json(serde_json::json!({
        "answer_id": answer.id,
        "text": answer.text,
        "username": answer.username,
        "timestamp": answer.created_at,
    }))
    .into_response())
}

/// PATCH /answers/{id}/edit — author only
async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
    Json(payload): Json<AnswerPayload>,
) -> AppResult<Response> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Answer text is required".into()));
    }

    let conn = state.db.get()?;
    let answer = answers::update_answer(&conn, &current.username, id, text)?;

    Ok(Json(serde_json::json!({ "text": answer.text })).into_response())
}

/// DELETE /answers/{id}/delete — author only
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    answers::delete_answer(&conn, &current.username, id)?;
    Ok(Json(serde_json::json!({ "delete": "success" })).into_response())
}

/// POST /answers/{id}/upvote — no self-upvotes
async fn upvote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let upvote = votes::upvote_answer(&conn, &current.username, id, state.config.votes.dedupe)?;
    Ok(Json(serde_json::json!({
        "answer": upvote.answer_id,
        "username": upvote.username,
    }))
    .into_response())
}

/// DELETE /answers/{id}/remove_upvote — clears every matching row
async fn remove_upvote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    votes::remove_answer_upvotes(&conn, &current.username, id)?;
    Ok(Json(serde_json::json!({ "answer": id })).into_response())
}
