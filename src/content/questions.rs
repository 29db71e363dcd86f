use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Question;
use crate::error::{AppError, AppResult};

pub struct NewQuestion<'a> {
    pub title: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Default, Clone)]
pub struct QuestionPatch {
    pub title: Option<String>,
    pub text: Option<String>,
}

const QUESTION_COLUMNS: &str = "id, title, text, created_at, game_id, username";

fn row_to_question(row: &rusqlite::Row) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
        game_id: row.get(4)?,
        username: row.get(5)?,
    })
}

pub fn find_question(conn: &Connection, id: i64) -> AppResult<Option<Question>> {
    conn.query_row(
        &format!("SELECT {} FROM questions WHERE id = ?1", QUESTION_COLUMNS),
        params![id],
        row_to_question,
    )
    .optional()
    .map_err(Into::into)
}

pub fn create_question(
    conn: &Connection,
    author: &str,
    game_id: i64,
    new: &NewQuestion,
) -> AppResult<Question> {
    conn.execute(
        "INSERT INTO questions (title, text, game_id, username) VALUES (?1, ?2, ?3, ?4)",
        params![new.title, new.text, game_id, author],
    )?;
    let id = conn.last_insert_rowid();
    find_question(conn, id)?.ok_or(AppError::NotFound)
}

pub fn update_question(
    conn: &Connection,
    actor: &str,
    id: i64,
    patch: &QuestionPatch,
) -> AppResult<Question> {
    let question = find_question(conn, id)?.ok_or(AppError::NotFound)?;
    if question.username.as_deref() != Some(actor) {
        return Err(AppError::Forbidden(
            "Only a question's author can edit a question".into(),
        ));
    }

    conn.execute(
        "UPDATE questions SET
            title = COALESCE(?1, title),
            text = COALESCE(?2, text)
         WHERE id = ?3",
        params![patch.title, patch.text, id],
    )?;
    find_question(conn, id)?.ok_or(AppError::NotFound)
}

/// Author-only. Cascades to the question's answers and their upvotes;
/// returns the owning game id.
pub fn delete_question(conn: &Connection, actor: &str, id: i64) -> AppResult<i64> {
    let question = find_question(conn, id)?.ok_or(AppError::NotFound)?;
    if question.username.as_deref() != Some(actor) {
        return Err(AppError::Forbidden(
            "You can only delete your own question".into(),
        ));
    }

    conn.execute("DELETE FROM questions WHERE id = ?1", params![id])?;
    Ok(question.game_id)
}

pub fn list_for_game(conn: &Connection, game_id: i64) -> AppResult<Vec<Question>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM questions WHERE game_id = ?1 ORDER BY id DESC",
        QUESTION_COLUMNS
    ))?;
    let questions = stmt
        .query_map(params![game_id], row_to_question)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(questions)
}

pub fn list_for_user(conn: &Connection, username: &str) -> AppResult<Vec<Question>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM questions WHERE username = ?1 ORDER BY id DESC",
        QUESTION_COLUMNS
    ))?;
    let questions = stmt
        .query_map(params![username], row_to_question)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(questions)
}

pub fn recent(conn: &Connection, limit: i64) -> AppResult<Vec<Question>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM questions ORDER BY id DESC LIMIT ?1",
        QUESTION_COLUMNS
    ))?;
    let questions = stmt
        .query_map(params![limit], row_to_question)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(questions)
}

/// Questions the user has answered, deduplicated, newest first. Backs
/// the profile page's "answered" section.
pub fn answered_by(conn: &Connection, username: &str) -> AppResult<Vec<Question>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT {} FROM questions q
         JOIN answers a ON a.question_id = q.id
         WHERE a.username = ?1
         ORDER BY q.id DESC",
        QUESTION_COLUMNS
            .split(", ")
            .map(|c| format!("q.{}", c))
            .collect::<Vec<_>>()
            .join(", ")
    ))?;
    let questions = stmt
        .query_map(params![username], row_to_question)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(questions)
}
