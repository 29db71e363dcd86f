//! Client for the external game catalog plus the lazy local cache.
//!
//! Only `get_or_fetch` persists anything: name and background image are
//! written once on first reference and never refreshed. Search results
//! and display-time details (description, screenshots) always come
//! straight from the catalog.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use crate::db::models::Game;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Full record for a game detail page.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogGame {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub description_raw: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Screenshot {
    pub id: i64,
    pub image: String,
}

#[derive(Debug, Deserialize)]
struct ResultsPage<T> {
    results: Vec<T>,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn game(&self, id: i64) -> AppResult<CatalogGame> {
        let url = format!("{}/games/{}", self.base_url, id);
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(upstream)?;
        if !resp.status().is_success() {
            return Err(AppError::Upstream(format!(
                "catalog returned {} for game {}",
                resp.status(),
                id
            )));
        }
        resp.json::<CatalogGame>().await.map_err(upstream)
    }

    /// Pure passthrough to the catalog's search endpoint.
    pub async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>> {
        let url = format!("{}/games", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("search", query)])
            .send()
            .await
            .map_err(upstream)?;
        if !resp.status().is_success() {
            return Err(AppError::Upstream(format!(
                "catalog search returned {}",
                resp.status()
            )));
        }
        resp.json::<ResultsPage<SearchHit>>()
            .await
            .map(|page| page.results)
            .map_err(upstream)
    }

    pub async fn screenshots(&self, id: i64) -> AppResult<Vec<Screenshot>> {
        let url = format!("{}/games/{}/screenshots", self.base_url, id);
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(upstream)?;
        if !resp.status().is_success() {
            return Err(AppError::Upstream(format!(
                "catalog returned {} for game {} screenshots",
                resp.status(),
                id
            )));
        }
        resp.json::<ResultsPage<Screenshot>>()
            .await
            .map(|page| page.results)
            .map_err(upstream)
    }
}

fn upstream(e: reqwest::Error) -> AppError {
    AppError::Upstream(e.to_string())
}

pub fn find_game(conn: &Connection, id: i64) -> AppResult<Option<Game>> {
    conn.query_row(
        "SELECT id, name, background_image FROM games WHERE id = ?1",
        params![id],
        |row| {
            Ok(Game {
                id: row.get(0)?,
                name: row.get(1)?,
                background_image: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

/// Return the cached Game row, creating it from the catalog on first
/// reference. A failed or malformed catalog response creates nothing.
pub async fn get_or_fetch(pool: &DbPool, client: &CatalogClient, id: i64) -> AppResult<Game> {
    // Connection scoped so it is released before the network call.
    {
        let conn = pool.get()?;
        if let Some(game) = find_game(&conn, id)? {
            return Ok(game);
        }
    }

    let fetched = client.game(id).await?;

    let conn = pool.get()?;
    // OR IGNORE: a concurrent request may have cached it first; the row
    // is created at most once and never overwritten.
    conn.execute(
        "INSERT OR IGNORE INTO games (id, name, background_image) VALUES (?1, ?2, ?3)",
        params![id, fetched.name, fetched.background_image],
    )?;
    find_game(&conn, id)?.ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn catalog_game_parses_full_payload() {
        let json = r#"{
            "id": 3498,
            "name": "Grand Theft Auto V",
            "background_image": "https://media.example/gta5.jpg",
            "released": "2013-09-17",
            "rating": 4.47,
            "description_raw": "An open world game."
        }"#;
        let game: CatalogGame = serde_json::from_str(json).unwrap();
        assert_eq!(game.id, 3498);
        assert_eq!(game.name, "Grand Theft Auto V");
        assert_eq!(game.rating, Some(4.47));
    }

    #[test]
    fn catalog_game_tolerates_missing_optional_fields() {
        let json = r#"{"id": 1, "name": "Foo", "background_image": null}"#;
        let game: CatalogGame = serde_json::from_str(json).unwrap();
        assert!(game.background_image.is_none());
        assert!(game.released.is_none());
    }

    #[test]
    fn catalog_game_without_name_is_malformed() {
        let json = r#"{"id": 1}"#;
        assert!(serde_json::from_str::<CatalogGame>(json).is_err());
    }

    #[test]
    fn search_results_parse_from_results_envelope() {
        let json = r#"{"results": [
            {"id": 1, "name": "Foo"},
            {"id": 2, "name": "Foo 2", "released": "2020-01-01"}
        ]}"#;
        let page: ResultsPage<SearchHit> = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].released.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn game_rows_are_created_at_most_once() {
        let pool = test_pool();
        let conn = pool.get().unwrap();

        conn.execute(
            "INSERT OR IGNORE INTO games (id, name, background_image) VALUES (1, 'Foo', NULL)",
            [],
        )
        .unwrap();
        // second insert with different fields must not overwrite
        conn.execute(
            "INSERT OR IGNORE INTO games (id, name, background_image) VALUES (1, 'Bar', 'x')",
            [],
        )
        .unwrap();

        let game = find_game(&conn, 1).unwrap().unwrap();
        assert_eq!(game.name, "Foo");
        assert!(game.background_image.is_none());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM games", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn find_game_misses_return_none() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        assert!(find_game(&conn, 404).unwrap().is_none());
    }
}
