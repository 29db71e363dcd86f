//! End-to-end tests for signup, login and profile management.

mod common;

use common::{client, count, register, spawn_app};

#[tokio::test]
async fn signup_logs_in_and_shows_the_homepage() {
    let app = spawn_app().await;
    let client = client();

    register(&app, &client, "alice").await;

    // session cookie is live: /register now bounces home
    let resp = client
        .get(format!("{}/register", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/");

    assert_eq!(count(&app, "SELECT COUNT(*) FROM users"), 1);
    assert_eq!(count(&app, "SELECT COUNT(*) FROM sessions"), 1);
}

#[tokio::test]
async fn duplicate_username_redisplays_the_form() {
    let app = spawn_app().await;
    register(&app, &client(), "alice").await;

    let second = client();
    let resp = second
        .post(format!("{}/register", app.base_url))
        .form(&[
            ("username", "alice"),
            ("email", "other@example.com"),
            ("first_name", "Other"),
            ("last_name", "Person"),
            ("password", "pw"),
            ("confirm", "pw"),
        ])
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    let body = resp.text().await.unwrap();
    assert!(body.contains("Username not available"));
    assert_eq!(count(&app, "SELECT COUNT(*) FROM users"), 1);
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_accepts_good_ones() {
    let app = spawn_app().await;
    register(&app, &client(), "alice").await;

    let fresh = client();
    let resp = fresh
        .post(format!("{}/login", app.base_url))
        .form(&[("username", "alice"), ("password", "wrong")])
        .send()
        .await
        .unwrap();
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid credentials."));

    let resp = fresh
        .post(format!("{}/login", app.base_url))
        .form(&[("username", "alice"), ("password", "hunter2")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Hello, alice!"));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = spawn_app().await;
    let client = client();
    register(&app, &client, "alice").await;

    let resp = client
        .post(format!("{}/logout", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/login");

    assert_eq!(count(&app, "SELECT COUNT(*) FROM sessions"), 0);
}

#[tokio::test]
async fn profile_edit_applies_only_non_empty_fields() {
    let app = spawn_app().await;
    let client = client();
    register(&app, &client, "alice").await;

    let resp = client
        .post(format!("{}/users/alice/edit", app.base_url))
        .form(&[
            ("email", ""),
            ("bio", "Speedrunner"),
            ("image_url", ""),
            ("new_password", ""),
            ("confirm", ""),
            ("password", "hunter2"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/users/alice");

    let conn = app.pool.get().unwrap();
    let (email, bio): (String, String) = conn
        .query_row(
            "SELECT email, bio FROM users WHERE username = 'alice'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(email, "alice@example.com");
    assert_eq!(bio, "Speedrunner");
}

#[tokio::test]
async fn profile_edit_rejects_a_wrong_current_password() {
    let app = spawn_app().await;
    let client = client();
    register(&app, &client, "alice").await;

    let resp = client
        .post(format!("{}/users/alice/edit", app.base_url))
        .form(&[
            ("email", ""),
            ("bio", "hacked"),
            ("image_url", ""),
            ("new_password", ""),
            ("confirm", ""),
            ("password", "wrong"),
        ])
        .send()
        .await
        .unwrap();
    // bounced back to the edit form with a notice
    assert_eq!(resp.url().path(), "/users/alice/edit");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Username and password do not match"));

    let conn = app.pool.get().unwrap();
    let bio: String = conn
        .query_row("SELECT bio FROM users WHERE username = 'alice'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(bio, "No bio yet");
}

#[tokio::test]
async fn users_cannot_edit_each_other() {
    let app = spawn_app().await;
    register(&app, &client(), "alice").await;

    let bob = client();
    register(&app, &bob, "bob").await;

    let resp = bob
        .get(format!("{}/users/alice/edit", app.base_url))
        .send()
        .await
        .unwrap();
    // forbidden: redirected home with a notice
    assert_eq!(resp.url().path(), "/");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Access unauthorized"));
}

#[tokio::test]
async fn account_deletion_orphans_content_and_drops_upvotes() {
    let app = spawn_app().await;
    let alice = client();
    register(&app, &alice, "alice").await;
    let bob = client();
    register(&app, &bob, "bob").await;

    // alice reviews game 1; bob likes it; alice likes bob's later review
    alice
        .post(format!("{}/games/1/review", app.base_url))
        .form(&[("title", "Loved it"), ("rating", "9"), ("text", "so good")])
        .send()
        .await
        .unwrap();
    bob.post(format!("{}/games/1/review", app.base_url))
        .form(&[("title", "Meh"), ("rating", "5"), ("text", "alright")])
        .send()
        .await
        .unwrap();
    bob.post(format!("{}/reviews/1/upvote", app.base_url))
        .send()
        .await
        .unwrap();
    alice
        .post(format!("{}/reviews/2/upvote", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(count(&app, "SELECT COUNT(*) FROM upvotes"), 2);

    let resp = alice
        .post(format!("{}/users/alice/delete", app.base_url))
        .form(&[("password", "hunter2")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Game Over"));

    // her review survives authorless; her vote is gone, bob's remains
    assert_eq!(count(&app, "SELECT COUNT(*) FROM users"), 1);
    assert_eq!(count(&app, "SELECT COUNT(*) FROM reviews"), 2);
    assert_eq!(
        count(
            &app,
            "SELECT COUNT(*) FROM reviews WHERE id = 1 AND username IS NULL"
        ),
        1
    );
    assert_eq!(count(&app, "SELECT COUNT(*) FROM upvotes"), 1);
    assert_eq!(
        count(&app, "SELECT COUNT(*) FROM upvotes WHERE username = 'bob'"),
        1
    );
}
