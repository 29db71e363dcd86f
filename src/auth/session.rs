use rand::Rng;
use rusqlite::{params, Connection};

/// Create a new session for a user. Returns the session token.
pub fn create_session(
    conn: &Connection,
    username: &str,
    hours: u64,
) -> Result<String, rusqlite::Error> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, username, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, username, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> Result<(), rusqlite::Error> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
