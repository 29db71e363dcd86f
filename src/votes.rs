//! Upvote ledger for reviews and answers.
//!
//! There is deliberately no uniqueness on (user, target): concurrent
//! double-clicks can insert duplicate rows, and the unlike operations
//! delete every matching row at once. `dedupe` (off by default) makes
//! upvoting idempotent instead.

use rusqlite::{params, Connection, OptionalExtension};

use crate::content::{answers, reviews};
use crate::db::models::Upvote;
use crate::error::{AppError, AppResult};

const UPVOTE_COLUMNS: &str = "id, username, review_id, answer_id";

fn row_to_upvote(row: &rusqlite::Row) -> rusqlite::Result<Upvote> {
    Ok(Upvote {
        id: row.get(0)?,
        username: row.get(1)?,
        review_id: row.get(2)?,
        answer_id: row.get(3)?,
    })
}

pub fn upvote_review(
    conn: &Connection,
    actor: &str,
    review_id: i64,
    dedupe: bool,
) -> AppResult<Upvote> {
    let review = reviews::find_review(conn, review_id)?.ok_or(AppError::NotFound)?;
    if review.username.as_deref() == Some(actor) {
        return Err(AppError::Forbidden(
            "It is important to like yourself, but you can't like your own review".into(),
        ));
    }

    if dedupe {
        let existing = conn
            .query_row(
                &format!(
                    "SELECT {} FROM upvotes WHERE username = ?1 AND review_id = ?2 LIMIT 1",
                    UPVOTE_COLUMNS
                ),
                params![actor, review_id],
                row_to_upvote,
            )
            .optional()?;
        if let Some(upvote) = existing {
            return Ok(upvote);
        }
    }

    conn.execute(
        "INSERT INTO upvotes (username, review_id) VALUES (?1, ?2)",
        params![actor, review_id],
    )?;
    let id = conn.last_insert_rowid();
    find_upvote(conn, id)?.ok_or(AppError::NotFound)
}

/// Removes every row the actor has on this review, however many the
/// double-click race produced.
pub fn remove_review_upvotes(conn: &Connection, actor: &str, review_id: i64) -> AppResult<()> {
    conn.execute(
        "DELETE FROM upvotes WHERE username = ?1 AND review_id = ?2",
        params![actor, review_id],
    )?;
    Ok(())
}

pub fn upvote_answer(
    conn: &Connection,
    actor: &str,
    answer_id: i64,
    dedupe: bool,
) -> AppResult<Upvote> {
    let answer = answers::find_answer(conn, answer_id)?.ok_or(AppError::NotFound)?;
    if answer.username.as_deref() == Some(actor) {
        return Err(AppError::Forbidden(
            "It is important to like yourself, but you can't like your own answer".into(),
        ));
    }

    if dedupe {
        let existing = conn
            .query_row(
                &format!(
                    "SELECT {} FROM upvotes WHERE username = ?1 AND answer_id = ?2 LIMIT 1",
                    UPVOTE_COLUMNS
                ),
                params![actor, answer_id],
                row_to_upvote,
            )
            .optional()?;
        if let Some(upvote) = existing {
            return Ok(upvote);
        }
    }

    conn.execute(
        "INSERT INTO upvotes (username, answer_id) VALUES (?1, ?2)",
        params![actor, answer_id],
    )?;
    let id = conn.last_insert_rowid();
    find_upvote(conn, id)?.ok_or(AppError::NotFound)
}

pub fn remove_answer_upvotes(conn: &Connection, actor: &str, answer_id: i64) -> AppResult<()> {
    conn.execute(
        "DELETE FROM upvotes WHERE username = ?1 AND answer_id = ?2",
        params![actor, answer_id],
    )?;
    Ok(())
}

fn find_upvote(conn: &Connection, id: i64) -> AppResult<Option<Upvote>> {
    conn.query_row(
        &format!("SELECT {} FROM upvotes WHERE id = ?1", UPVOTE_COLUMNS),
        params![id],
        row_to_upvote,
    )
    .optional()
    .map_err(Into::into)
}

/// Answer ids the viewer has upvoted, derived from their own rows.
pub fn upvoted_answer_ids(conn: &Connection, username: &str) -> AppResult<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT answer_id FROM upvotes WHERE username = ?1")?;
    let ids = stmt
        .query_map(params![username], |row| row.get::<_, Option<i64>>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids.into_iter().flatten().collect())
}

/// Usernames who upvoted a review, for the review detail page.
pub fn review_upvoters(conn: &Connection, review_id: i64) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT username FROM upvotes WHERE review_id = ?1 AND username IS NOT NULL",
    )?;
    let names = stmt
        .query_map(params![review_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

pub fn answer_upvote_count(conn: &Connection, answer_id: i64) -> AppResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM upvotes WHERE answer_id = ?1",
        params![answer_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}
