//! Identity store: signup, credential verification, profile edits and
//! self-service account deletion.
//!
//! Deleting a user orphans their reviews, questions and answers (author
//! set NULL) while removing their upvotes and sessions outright; the
//! foreign key actions in the schema carry that policy.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::User;
use crate::error::{AppError, AppResult};

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Profile edit where `None` means "leave unchanged". Empty form fields
/// are mapped to `None` before they get here.
#[derive(Debug, Default, Clone)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub new_password: Option<String>,
}

const USER_COLUMNS: &str =
    "username, password_hash, email, first_name, last_name, bio, image_url, created_at";

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        username: row.get(0)?,
        password_hash: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        bio: row.get(5)?,
        image_url: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn find(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
        params![username],
        row_to_user,
    )
    .optional()
    .map_err(Into::into)
}

/// Register a new user. The username is taken as-is and immutable after
/// this; only a bcrypt hash of the password is stored.
pub fn signup(conn: &Connection, new: &NewUser) -> AppResult<User> {
    let hash = bcrypt::hash(new.password, bcrypt::DEFAULT_COST)?;

    let result = conn.execute(
        "INSERT INTO users (username, password_hash, email, first_name, last_name)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.username, hash, new.email, new.first_name, new.last_name],
    );
    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(AppError::Conflict("Username not available".into()));
        }
        Err(e) => return Err(e.into()),
    }

    find(conn, new.username)?.ok_or(AppError::NotFound)
}

/// Verify credentials. Bad credentials are a `None`, not an error.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> AppResult<Option<User>> {
    let Some(user) = find(conn, username)? else {
        return Ok(None);
    };

    if bcrypt::verify(password, &user.password_hash).unwrap_or(false) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Apply a profile patch after re-verifying the current password.
/// Returns `None` (and changes nothing) when re-authentication fails.
pub fn update_profile(
    conn: &Connection,
    username: &str,
    current_password: &str,
    patch: &ProfilePatch,
) -> AppResult<Option<User>> {
    if authenticate(conn, username, current_password)?.is_none() {
        return Ok(None);
    }

    let new_hash = match &patch.new_password {
        Some(pw) => Some(bcrypt::hash(pw, bcrypt::DEFAULT_COST)?),
        None => None,
    };

    conn.execute(
        "UPDATE users SET
            email = COALESCE(?1, email),
            bio = COALESCE(?2, bio),
            image_url = COALESCE(?3, image_url),
            password_hash = COALESCE(?4, password_hash)
         WHERE username = ?5",
        params![patch.email, patch.bio, patch.image_url, new_hash, username],
    )?;

    let user = find(conn, username)?.ok_or(AppError::NotFound)?;
    Ok(Some(user))
}

/// Delete the account after re-verifying the password. Returns `false`
/// (and deletes nothing) when re-authentication fails.
pub fn delete_user(conn: &Connection, username: &str, password: &str) -> AppResult<bool> {
    if authenticate(conn, username, password)?.is_none() {
        return Ok(false);
    }

    conn.execute("DELETE FROM users WHERE username = ?1", params![username])?;
    Ok(true)
}
