#![allow(clippy::unwrap_used)]


use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use crate::mail::Mailer;
use crate::router::setup_router;
use crate::state::AppState;

pub const JWT_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "testpassword123";

/// Spin up an in-process server against a throwaway database. The TempDir
/// must be kept alive for the duration of the test.
pub fn setup_server() -> (TestServer, TempDir) {
    let dir = TempDir::new().unwrap();
    let db = memo_core::open_db(&dir.path().join("test.db")).unwrap();

    let state = AppState::new(db, JWT_SECRET, "http://localhost:8080", Mailer::Log);
    let server = TestServer::new(setup_router(state)).unwrap();

    (server, dir)
}

/// Register a "Kerry Hilson" account under the given email, returning the
/// new user id.
pub async fn register(server: &TestServer, email: &str) -> i64 {
    let response = server
        .post("/register")
        .json(&json!({
            "first_name": "Kerry",
            "last_name": "Hilson",
            "email": email,
            "password": PASSWORD,
        }))
        .await;

    response.assert_status_ok();
    response.json::<serde_json::Value>()["id"].as_i64().unwrap()
}

pub async fn login(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/login")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await;

    response.assert_status_ok();

    response.json::<serde_json::Value>()["token"]
        .as_str()
        .unwrap()
        .to_string()
}

pub async fn create_note(
    server: &TestServer,
    token: &str,
    title: &str,
    slug: &str,
) -> serde_json::Value {
    let response = server
        .post("/notes")
        .authorization_bearer(token)
        .json(&json!({
            "title": title,
            "slug": slug,
            "content": "some content",
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<serde_json::Value>()
}
