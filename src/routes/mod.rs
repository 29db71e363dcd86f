pub mod answers;
pub mod assets;
pub mod auth;
pub mod games;
pub mod home;
pub mod questions;
pub mod reviews;
pub mod users;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(auth::router())
        .merge(users::router())
        .merge(games::router())
        .merge(reviews::router())
        .merge(questions::router())
        .merge(answers::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
