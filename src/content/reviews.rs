use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Review;
use crate::error::{AppError, AppResult};

pub struct NewReview<'a> {
    pub title: &'a str,
    pub rating: f64,
    pub text: &'a str,
}

/// Partial edit; `None` leaves the field unchanged.
#[derive(Debug, Default, Clone)]
pub struct ReviewPatch {
    pub title: Option<String>,
    pub rating: Option<f64>,
    pub text: Option<String>,
}

/// Ratings are kept at one-decimal precision.
pub fn round_rating(rating: f64) -> f64 {
    (rating * 10.0).round() / 10.0
}

const REVIEW_COLUMNS: &str = "id, title, rating, text, created_at, game_id, username";

fn row_to_review(row: &rusqlite::Row) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        title: row.get(1)?,
        rating: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
        game_id: row.get(5)?,
        username: row.get(6)?,
    })
}

pub fn find_review(conn: &Connection, id: i64) -> AppResult<Option<Review>> {
    conn.query_row(
        &format!("SELECT {} FROM reviews WHERE id = ?1", REVIEW_COLUMNS),
        params![id],
        row_to_review,
    )
    .optional()
    .map_err(Into::into)
}

pub fn create_review(
    conn: &Connection,
    author: &str,
    game_id: i64,
    new: &NewReview,
) -> AppResult<Review> {
    conn.execute(
        "INSERT INTO reviews (title, rating, text, game_id, username)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.title, round_rating(new.rating), new.text, game_id, author],
    )?;
    let id = conn.last_insert_rowid();
    find_review(conn, id)?.ok_or(AppError::NotFound)
}

pub fn update_review(
    conn: &Connection,
    actor: &str,
    id: i64,
    patch: &ReviewPatch,
) -> AppResult<Review> {
    let review = find_review(conn, id)?.ok_or(AppError::NotFound)?;
    if review.username.as_deref() != Some(actor) {
        return Err(AppError::Forbidden(
            "Only a review's author can edit a review".into(),
        ));
    }

    conn.execute(
        "UPDATE reviews SET
            title = COALESCE(?1, title),
            rating = COALESCE(?2, rating),
            text = COALESCE(?3, text)
         WHERE id = ?4",
        params![patch.title, patch.rating.map(round_rating), patch.text, id],
    )?;
    find_review(conn, id)?.ok_or(AppError::NotFound)
}

/// Author-only. Returns the owning game id so the caller can refresh
/// that game's pages. Upvotes on the review go with it.
pub fn delete_review(conn: &Connection, actor: &str, id: i64) -> AppResult<i64> {
    let review = find_review(conn, id)?.ok_or(AppError::NotFound)?;
    if review.username.as_deref() != Some(actor) {
        return Err(AppError::Forbidden(
            "You can only delete your own review".into(),
        ));
    }

    conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
    Ok(review.game_id)
}

pub fn list_for_game(conn: &Connection, game_id: i64) -> AppResult<Vec<Review>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM reviews WHERE game_id = ?1 ORDER BY id DESC",
        REVIEW_COLUMNS
    ))?;
    let reviews = stmt
        .query_map(params![game_id], row_to_review)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reviews)
}

pub fn list_for_user(conn: &Connection, username: &str) -> AppResult<Vec<Review>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM reviews WHERE username = ?1 ORDER BY id DESC",
        REVIEW_COLUMNS
    ))?;
    let reviews = stmt
        .query_map(params![username], row_to_review)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reviews)
}

pub fn recent(conn: &Connection, limit: i64) -> AppResult<Vec<Review>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM reviews ORDER BY id DESC LIMIT ?1",
        REVIEW_COLUMNS
    ))?;
    let reviews = stmt
        .query_map(params![limit], row_to_review)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reviews)
}

/// Mean of all ratings for a game, rounded to two decimals. `None` is
/// the "no ratings yet" sentinel, distinct from a zero average.
pub fn average_rating(conn: &Connection, game_id: i64) -> AppResult<Option<f64>> {
    let avg: Option<f64> = conn.query_row(
        "SELECT AVG(rating) FROM reviews WHERE game_id = ?1",
        params![game_id],
        |row| row.get(0),
    )?;
    Ok(avg.map(|a| (a * 100.0).round() / 100.0))
}
