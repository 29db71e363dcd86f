use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::auth::flash::Flash;
use crate::catalog::{self, CatalogGame, Screenshot, SearchHit};
use crate::db::models::Game;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::routes::home::page;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub game: String,
}

#[derive(Template)]
#[template(path = "games/results.html")]
struct ResultsTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    query: String,
    games: Vec<SearchHit>,
}

#[derive(Template)]
#[template(path = "games/info.html")]
struct InfoTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    details: CatalogGame,
}

#[derive(Template)]
#[template(path = "games/screenshots.html")]
struct ScreenshotsTemplate {
    viewer: Option<String>,
    notice: Option<String>,
    game: Game,
    screenshots: Vec<Screenshot>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/games/search", get(search))
        .route("/games/{id}", get(info))
        .route("/games/{id}/screenshots", get(screenshots))
}

/// GET /games/search?game=q — straight passthrough, nothing persisted
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let games = state.catalog.search(&query.game).await?;

    let had_notice = notice.is_some();
    Ok(page(
        ResultsTemplate {
            viewer: viewer.map(|u| u.username),
            notice,
            query: query.game,
            games,
        },
        had_notice,
    ))
}

/// GET /games/{id} — caches the game row on first sight, then still asks
/// the catalog for the display-time details.
async fn info(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let game = catalog::get_or_fetch(&state.db, &state.catalog, id).await?;
    let details = state.catalog.game(id).await?;

    let had_notice = notice.is_some();
    Ok(page(
        InfoTemplate {
            viewer: viewer.map(|u| u.username),
            notice,
            game,
            details,
        },
        had_notice,
    ))
}

/// GET /games/{id}/screenshots
async fn screenshots(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    MaybeUser(viewer): MaybeUser,
    Flash(notice): Flash,
) -> AppResult<Response> {
    let game = catalog::get_or_fetch(&state.db, &state.catalog, id).await?;
    let shots = state.catalog.screenshots(id).await?;

    let had_notice = notice.is_some();
    Ok(page(
        ScreenshotsTemplate {
            viewer: viewer.map(|u| u.username),
            notice,
            game,
            screenshots: shots,
        },
        had_notice,
    ))
}
