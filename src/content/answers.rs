use rusqlite::{params, Connection, OptionalExtension};

use crate::content::questions;
use crate::db::models::Answer;
use crate::error::{AppError, AppResult};

const ANSWER_COLUMNS: &str = "id, text, created_at, question_id, username";

fn row_to_answer(row: &rusqlite::Row) -> rusqlite::Result<Answer> {
    Ok(Answer {
        id: row.get(0)?,
        text: row.get(1)?,
        created_at: row.get(2)?,
        question_id: row.get(3)?,
        username: row.get(4)?,
    })
}

pub fn find_answer(conn: &Connection, id: i64) -> AppResult<Option<Answer>> {
    conn.query_row(
        &format!("SELECT {} FROM answers WHERE id = ?1", ANSWER_COLUMNS),
        params![id],
        row_to_answer,
    )
    .optional()
    .map_err(Into::into)
}

/// The parent question must exist.
pub fn create_answer(
    conn: &Connection,
    author: &str,
    question_id: i64,
    text: &str,
) -> AppResult<Answer> {
    if questions::find_question(conn, question_id)?.is_none() {
        return Err(AppError::NotFound);
    }

    conn.execute(
        "INSERT INTO answers (text, question_id, username) VALUES (?1, ?2, ?3)",
        params![text, question_id, author],
    )?;
    let id = conn.last_insert_rowid();
    find_answer(conn, id)?.ok_or(AppError::NotFound)
}

pub fn update_answer(conn: &Connection, actor: &str, id: i64, text: &str) -> AppResult<Answer> {
    let answer = find_answer(conn, id)?.ok_or(AppError::NotFound)?;
    if answer.username.as_deref() != Some(actor) {
        return Err(AppError::Forbidden(
            "You can only edit your own answer".into(),
        ));
    }

    conn.execute(
        "UPDATE answers SET text = ?1 WHERE id = ?2",
        params![text, id],
    )?;
    find_answer(conn, id)?.ok_or(AppError::NotFound)
}

/// Author-only. Upvotes on the answer cascade away; returns the id of
/// the game the parent question belongs to.
pub fn delete_answer(conn: &Connection, actor: &str, id: i64) -> AppResult<i64> {
    let answer = find_answer(conn, id)?.ok_or(AppError::NotFound)?;
    if answer.username.as_deref() != Some(actor) {
        return Err(AppError::Forbidden(
            "You can only delete your own answer".into(),
        ));
    }

    let game_id = questions::find_question(conn, answer.question_id)?
        .ok_or(AppError::NotFound)?
        .game_id;
    conn.execute("DELETE FROM answers WHERE id = ?1", params![id])?;
    Ok(game_id)
}

/// Oldest first: an answer thread reads top to bottom.
pub fn list_for_question(conn: &Connection, question_id: i64) -> AppResult<Vec<Answer>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM answers WHERE question_id = ?1 ORDER BY id ASC",
        ANSWER_COLUMNS
    ))?;
    let answers = stmt
        .query_map(params![question_id], row_to_answer)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(answers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::questions::{create_question, NewQuestion};
    use crate::db::test_pool;
    use crate::state::DbPool;

    fn seed(pool: &DbPool) -> i64 {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (username, password_hash, email, first_name, last_name)
             VALUES ('alice', 'x', 'a@b.c', 'Alice', 'Ames'),
                    ('bob', 'x', 'b@b.c', 'Bob', 'Byers')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO games (id, name) VALUES (1, 'Foo')", [])
            .unwrap();
        create_question(
            &conn,
            "alice",
            1,
            &NewQuestion {
                title: "Q",
                text: "how",
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn answering_a_missing_question_is_not_found() {
        let pool = test_pool();
        seed(&pool);
        let conn = pool.get().unwrap();

        assert!(matches!(
            create_answer(&conn, "bob", 404, "hello").unwrap_err(),
            AppError::NotFound
        ));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM answers", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn thread_reads_oldest_first() {
        let pool = test_pool();
        let question_id = seed(&pool);
        let conn = pool.get().unwrap();

        create_answer(&conn, "bob", question_id, "first").unwrap();
        create_answer(&conn, "alice", question_id, "second").unwrap();

        let texts: Vec<String> = list_for_question(&conn, question_id)
            .unwrap()
            .into_iter()
            .map(|a| a.text)
            .collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn only_the_author_can_edit_or_delete() {
        let pool = test_pool();
        let question_id = seed(&pool);
        let conn = pool.get().unwrap();

        let answer = create_answer(&conn, "bob", question_id, "mine").unwrap();
        assert!(matches!(
            update_answer(&conn, "alice", answer.id, "stolen").unwrap_err(),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            delete_answer(&conn, "alice", answer.id).unwrap_err(),
            AppError::Forbidden(_)
        ));
        assert_eq!(
            find_answer(&conn, answer.id).unwrap().unwrap().text,
            "mine"
        );
    }

    #[test]
    fn delete_returns_the_owning_game_id() {
        let pool = test_pool();
        let question_id = seed(&pool);
        let conn = pool.get().unwrap();

        let answer = create_answer(&conn, "bob", question_id, "mine").unwrap();
        assert_eq!(delete_answer(&conn, "bob", answer.id).unwrap(), 1);
        assert!(find_answer(&conn, answer.id).unwrap().is_none());
    }
}
