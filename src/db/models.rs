use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub image_url: String,
    pub created_at: String,
}

/// A game row cached from the external catalog. Created at most once per
/// id; never refreshed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub name: String,
    pub background_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub title: String,
    pub rating: f64,
    pub text: String,
    pub created_at: String,
    pub game_id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub created_at: String,
    pub game_id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub question_id: i64,
    pub username: Option<String>,
}

/// References exactly one of a review or an answer, enforced by a table
/// CHECK constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upvote {
    pub id: i64,
    pub username: Option<String>,
    pub review_id: Option<i64>,
    pub answer_id: Option<i64>,
}

impl Review {
    pub fn author(&self) -> &str {
        author_or_deleted(&self.username)
    }

    pub fn posted_at(&self) -> String {
        readable_time(&self.created_at)
    }
}

impl Question {
    pub fn author(&self) -> &str {
        author_or_deleted(&self.username)
    }

    pub fn posted_at(&self) -> String {
        readable_time(&self.created_at)
    }
}

impl Answer {
    pub fn author(&self) -> &str {
        author_or_deleted(&self.username)
    }

    pub fn posted_at(&self) -> String {
        readable_time(&self.created_at)
    }
}

fn author_or_deleted(username: &Option<String>) -> &str {
    username.as_deref().unwrap_or("[deleted]")
}

/// Render a sqlite `datetime('now')` timestamp for display. Unparseable
/// values pass through untouched.
pub fn readable_time(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => dt.format("%b %d, %Y %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}
