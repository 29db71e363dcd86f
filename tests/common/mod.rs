//! Shared harness: the app under test on an ephemeral port, backed by a
//! stub catalog server that answers like the real one.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tempfile::TempDir;

use sidequest::catalog::CatalogClient;
use sidequest::config::Config;
use sidequest::state::{AppState, DbPool};
use sidequest::{db, routes};

pub struct TestApp {
    pub base_url: String,
    pub pool: DbPool,
    _data_dir: TempDir,
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Catalog stub: every game is called "Foo"; id 404 is unknown.
pub async fn spawn_stub_catalog() -> String {
    let router = Router::new()
        .route(
            "/games",
            get(|| async {
                Json(json!({"results": [
                    {"id": 1, "name": "Foo", "background_image": null, "released": "2020-01-01"},
                    {"id": 2, "name": "Foo II", "background_image": null}
                ]}))
            }),
        )
        .route(
            "/games/{id}",
            get(|Path(id): Path<i64>| async move {
                if id == 404 {
                    return StatusCode::NOT_FOUND.into_response();
                }
                Json(json!({
                    "id": id,
                    "name": "Foo",
                    "background_image": "https://img.example/foo.jpg",
                    "released": "2020-01-01",
                    "rating": 4.5,
                    "description_raw": "A fine game."
                }))
                .into_response()
            }),
        )
        .route(
            "/games/{id}/screenshots",
            get(|| async {
                Json(json!({"results": [
                    {"id": 10, "image": "https://img.example/shot1.jpg"},
                    {"id": 11, "image": "https://img.example/shot2.jpg"}
                ]}))
            }),
        );
    serve(router).await
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(tweak: impl FnOnce(&mut Config)) -> TestApp {
    let catalog_url = spawn_stub_catalog().await;

    let data_dir = TempDir::new().unwrap();
    let db_path = data_dir.path().join("test.db");
    let pool = db::create_pool(&db_path).unwrap();
    db::run_migrations(&pool).unwrap();

    let mut config = Config::default();
    config.catalog.base_url = catalog_url.clone();
    config.catalog.api_key = "test-key".into();
    tweak(&mut config);

    let state = AppState {
        db: pool.clone(),
        config,
        catalog: CatalogClient::new(catalog_url, "test-key"),
    };

    let base_url = serve(routes::app(state)).await;
    TestApp {
        base_url,
        pool,
        _data_dir: data_dir,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

/// Register a user through the real signup flow; the client keeps the
/// session cookie.
pub async fn register(app: &TestApp, client: &reqwest::Client, username: &str) {
    let resp = client
        .post(format!("{}/register", app.base_url))
        .form(&[
            ("username", username),
            ("email", &format!("{}@example.com", username)),
            ("first_name", "Test"),
            ("last_name", "User"),
            ("password", "hunter2"),
            ("confirm", "hunter2"),
        ])
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
}

pub fn count(app: &TestApp, sql: &str) -> i64 {
    let conn = app.pool.get().unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}
