pub mod models;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../../migrations/001_initial.sql"),
)];

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            ",
        )
    });
    let pool = Pool::builder().max_size(8).build(manager)?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

/// In-memory single-connection pool with migrations applied, for unit tests.
#[cfg(test)]
pub fn test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    run_migrations(&pool).unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_pool_creates_db_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("sub/dir/test.db");
        let pool = create_pool(&db_path).unwrap();
        assert!(db_path.exists());
        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn migrations_create_all_tables() {
        let pool = test_pool();
        let conn = pool.get().unwrap();

        let tables: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .filter_map(|r| r.ok())
                .collect()
        };
        for table in [
            "users",
            "sessions",
            "games",
            "reviews",
            "questions",
            "answers",
            "upvotes",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn foreign_keys_enforced() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        // A review pointing at a game that was never cached must fail
        let result = conn.execute(
            "INSERT INTO reviews (title, rating, text, game_id, username)
             VALUES ('T', 9.0, 'great', 42, NULL)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn upvote_must_target_exactly_one_of_review_or_answer() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (username, password_hash, email, first_name, last_name)
             VALUES ('alice', 'x', 'a@b.c', 'Alice', 'Ames')",
            [],
        )
        .unwrap();

        // neither target set
        let neither = conn.execute(
            "INSERT INTO upvotes (username, review_id, answer_id) VALUES ('alice', NULL, NULL)",
            [],
        );
        assert!(neither.is_err());
    }

    #[test]
    fn username_length_capped_at_20() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let result = conn.execute(
            "INSERT INTO users (username, password_hash, email, first_name, last_name)
             VALUES ('a_very_long_username_over_twenty', 'x', 'a@b.c', 'A', 'B')",
            [],
        );
        assert!(result.is_err());
    }
}
